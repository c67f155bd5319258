//! Ratchet tree nodes.
//!
//! A slot in the tree's node array is an [`OptionalNode`]: either blank or
//! occupied by exactly one [`Node`]. Leaves carry a [`KeyPackage`], parents
//! carry a [`ParentNode`]. Every slot additionally caches the subtree hash
//! of its position; the cache is local state and never serialized.

use serde::{Deserialize, Serialize};

use super::errors::TreeError;
use super::hashes::{LeafNodeHashInput, ParentNodeHashInput};
use super::index::{LeafIndex, NodeIndex};
use crate::ciphersuite::{CipherSuite, CryptoError, HpkePrivateKey, HpkePublicKey};
use crate::key_packages::KeyPackage;

/// Content of a parent node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentNode {
    pub(crate) public_key: HpkePublicKey,
    pub(crate) unmerged_leaves: Vec<LeafIndex>,
    pub(crate) parent_hash: Vec<u8>,
    // Held by at most the members on this node's subtree; never serialized
    // with the node.
    #[serde(skip)]
    pub(crate) private_key: Option<HpkePrivateKey>,
}

// The private key is local state and not part of the node's identity.
impl PartialEq for ParentNode {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
            && self.unmerged_leaves == other.unmerged_leaves
            && self.parent_hash == other.parent_hash
    }
}

impl ParentNode {
    /// Create a parent node from the provided values.
    pub fn new(public_key: HpkePublicKey, unmerged_leaves: &[LeafIndex], parent_hash: &[u8]) -> Self {
        Self {
            public_key,
            unmerged_leaves: unmerged_leaves.to_vec(),
            parent_hash: parent_hash.to_vec(),
            private_key: None,
        }
    }

    /// Returns the node's HPKE public key.
    pub fn public_key(&self) -> &HpkePublicKey {
        &self.public_key
    }

    /// Returns the node's unmerged leaves, in insertion order.
    pub fn unmerged_leaves(&self) -> &[LeafIndex] {
        &self.unmerged_leaves
    }

    /// Returns the node's parent hash.
    pub fn parent_hash(&self) -> &[u8] {
        &self.parent_hash
    }

    pub fn private_key(&self) -> Option<&HpkePrivateKey> {
        self.private_key.as_ref()
    }

    /// Adds a leaf to the node's unmerged leaves.
    pub(crate) fn add_unmerged(&mut self, leaf_index: LeafIndex) {
        self.unmerged_leaves.push(leaf_index);
    }

    /// Replacing the public key invalidates all previously folded-in leaf
    /// secrets, so the unmerged list is cleared.
    pub(crate) fn set_public_key(&mut self, public_key: HpkePublicKey) {
        self.public_key = public_key;
        self.unmerged_leaves.clear();
    }

    pub(crate) fn set_private_key(&mut self, private_key: HpkePrivateKey) {
        self.private_key = Some(private_key);
    }

    pub(crate) fn set_parent_hash(&mut self, parent_hash: Vec<u8>) {
        self.parent_hash = parent_hash;
    }

    /// A fresh parent node whose key pair is derived from `path_secret`,
    /// with no unmerged leaves and an empty parent hash.
    pub(crate) fn from_path_secret(
        ciphersuite: CipherSuite,
        path_secret: &[u8],
    ) -> Result<Self, CryptoError> {
        let keypair = ciphersuite.derive_hpke_keypair(path_secret)?;
        let (private_key, public_key) = keypair.into_keys();
        let mut parent_node = ParentNode::new(public_key, &[], &[]);
        parent_node.set_private_key(private_key);
        Ok(parent_node)
    }
}

/// A ratchet tree node: a leaf with a key package or a parent node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf(KeyPackage),
    Parent(ParentNode),
}

impl Node {
    /// Returns the HPKE public key of either node kind.
    pub fn public_key(&self) -> &HpkePublicKey {
        match self {
            Node::Leaf(key_package) => key_package.hpke_init_key(),
            Node::Parent(parent_node) => parent_node.public_key(),
        }
    }

    /// Returns the held private key, if any.
    pub fn private_key(&self) -> Option<&HpkePrivateKey> {
        match self {
            Node::Leaf(key_package) => key_package.private_key(),
            Node::Parent(parent_node) => parent_node.private_key(),
        }
    }

    /// Attach a private key to either node kind.
    pub(crate) fn set_private_key(&mut self, private_key: HpkePrivateKey) {
        match self {
            Node::Leaf(key_package) => key_package.set_private_key(private_key),
            Node::Parent(parent_node) => parent_node.set_private_key(private_key),
        }
    }

    pub(crate) fn as_leaf(&self) -> Result<&KeyPackage, TreeError> {
        match self {
            Node::Leaf(key_package) => Ok(key_package),
            Node::Parent(_) => Err(TreeError::WrongNodeKind),
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> Result<&mut KeyPackage, TreeError> {
        match self {
            Node::Leaf(key_package) => Ok(key_package),
            Node::Parent(_) => Err(TreeError::WrongNodeKind),
        }
    }

    pub(crate) fn as_parent(&self) -> Result<&ParentNode, TreeError> {
        match self {
            Node::Leaf(_) => Err(TreeError::WrongNodeKind),
            Node::Parent(parent_node) => Ok(parent_node),
        }
    }

    pub(crate) fn as_parent_mut(&mut self) -> Result<&mut ParentNode, TreeError> {
        match self {
            Node::Leaf(_) => Err(TreeError::WrongNodeKind),
            Node::Parent(parent_node) => Ok(parent_node),
        }
    }
}

/// A blank-capable slot in the node array, with the cached subtree hash of
/// its position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalNode {
    pub(crate) node: Option<Node>,
    #[serde(skip)]
    pub(crate) hash: Vec<u8>,
}

// Slots compare by content; the hash cache is derived state.
impl PartialEq for OptionalNode {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl OptionalNode {
    pub(crate) fn blank() -> Self {
        Self::default()
    }

    /// An occupied leaf slot.
    pub(crate) fn new_leaf(key_package: KeyPackage) -> Self {
        OptionalNode {
            node: Some(Node::Leaf(key_package)),
            hash: Vec::new(),
        }
    }

    /// An occupied parent slot.
    pub(crate) fn new_parent(parent_node: ParentNode) -> Self {
        OptionalNode {
            node: Some(Node::Parent(parent_node)),
            hash: Vec::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.node.is_none()
    }

    pub(crate) fn set_to_blank(&mut self) {
        self.node = None;
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self) -> Option<&mut Node> {
        self.node.as_mut()
    }

    pub fn hash(&self) -> &[u8] {
        &self.hash
    }

    /// Install `public_key` on a parent slot, materializing an occupied
    /// parent if the slot is blank. Fails on an occupied leaf slot.
    pub(crate) fn merge_public(&mut self, public_key: HpkePublicKey) -> Result<(), TreeError> {
        match &mut self.node {
            None => {
                self.node = Some(Node::Parent(ParentNode::new(public_key, &[], &[])));
                Ok(())
            }
            Some(node) => {
                node.as_parent_mut()?.set_public_key(public_key);
                Ok(())
            }
        }
    }

    /// Recompute the cached hash for a leaf position.
    pub(crate) fn set_leaf_hash(
        &mut self,
        ciphersuite: CipherSuite,
        leaf_index: LeafIndex,
    ) -> Result<(), TreeError> {
        let key_package = match &self.node {
            None => None,
            Some(node) => Some(node.as_leaf()?),
        };
        let input = LeafNodeHashInput::new(leaf_index, key_package);
        self.hash = input.hash(ciphersuite)?;
        Ok(())
    }

    /// Recompute the cached hash for a parent position from the child
    /// hashes.
    pub(crate) fn set_parent_hash(
        &mut self,
        ciphersuite: CipherSuite,
        node_index: NodeIndex,
        left_hash: &[u8],
        right_hash: &[u8],
    ) -> Result<(), TreeError> {
        let parent_node = match &self.node {
            None => None,
            Some(node) => Some(node.as_parent()?),
        };
        let input = ParentNodeHashInput::new(node_index, parent_node, left_hash, right_hash);
        self.hash = input.hash(ciphersuite)?;
        Ok(())
    }
}
