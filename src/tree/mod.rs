//! # Ratchet tree
//!
//! The [`RatchetTree`] is the core of the group-keying engine: an
//! append-only left-balanced binary tree in which every leaf represents a
//! member and every parent holds an HPKE key pair derived by a one-way KDF
//! chain. A sender turns a single leaf secret into a fresh root secret
//! with [`RatchetTree::encap`], encrypting each path secret to the
//! resolution of the sibling subtree; every receiver decrypts exactly one
//! of those ciphertexts with [`RatchetTree::decap`] and re-derives the
//! same root secret.
//!
//! A tree is owned by one logical operator per epoch. All fallible
//! mutators are atomic: they work on a copy of the tree and swap it in on
//! success, so a caller never observes partial mutation.

use std::collections::BTreeMap;

use crate::ciphersuite::{CipherSuite, CryptoError, HpkeCiphertext, HpkePrivateKey, HpkePublicKey};
use crate::key_packages::KeyPackage;

mod codec;
pub mod errors;
mod hashes;
pub mod index;
pub mod node;
pub(crate) mod treemath;

pub use errors::TreeError;
use index::{LeafCount, LeafIndex, NodeIndex};
use node::{Node, OptionalNode, ParentNode};

/// One step of a published direct path: the new public key of an ancestor
/// and the path secret encrypted to the resolution of the sibling subtree.
///
/// ```text
/// struct {
///     HPKEPublicKey public_key;
///     HPKECiphertext encrypted_path_secrets<0..2^32-1>;
/// } DirectPathNode;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirectPathNode {
    pub public_key: HpkePublicKey,
    pub encrypted_path_secrets: Vec<HpkeCiphertext>,
}

/// The output of [`RatchetTree::encap`], one node per co-path entry of the
/// sender, ordered leaf to root.
///
/// ```text
/// struct {
///     DirectPathNode nodes<0..2^32-1>;
/// } DirectPath;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DirectPath {
    pub nodes: Vec<DirectPathNode>,
}

/// The exported secret state of a tree: the private keys held at occupied
/// slots, keyed by node index.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct TreeSecrets {
    pub private_keys: BTreeMap<NodeIndex, HpkePrivateKey>,
}

/// The ratchet tree.
#[derive(Debug, Clone)]
pub struct RatchetTree {
    ciphersuite: CipherSuite,
    nodes: Vec<OptionalNode>,
}

// Trees are equal if their node contents are; private keys, hash caches
// and the suite handle don't participate.
impl PartialEq for RatchetTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl RatchetTree {
    /// A fresh tree with zero nodes on the given suite.
    pub fn new(ciphersuite: CipherSuite) -> Self {
        RatchetTree {
            ciphersuite,
            nodes: Vec::new(),
        }
    }

    pub fn ciphersuite(&self) -> CipherSuite {
        self.ciphersuite
    }

    /// The number of leaves in the tree.
    pub fn leaf_count(&self) -> LeafCount {
        LeafCount::from(treemath::leaf_width(self.nodes.len()))
    }

    fn root_index(&self) -> NodeIndex {
        treemath::root(self.leaf_count())
    }

    fn leaf_in_tree(&self, leaf_index: LeafIndex) -> Result<(), TreeError> {
        if NodeIndex::from(leaf_index).as_usize() >= self.nodes.len() {
            Err(TreeError::InvalidIndex)
        } else {
            Ok(())
        }
    }

    // Fallible mutators go through here: all-or-nothing against `self`.
    fn with_working_copy<T>(
        &mut self,
        f: impl FnOnce(&mut RatchetTree) -> Result<T, TreeError>,
    ) -> Result<T, TreeError> {
        let mut tree = self.clone();
        let value = f(&mut tree)?;
        *self = tree;
        Ok(value)
    }

    // === Mutators ===

    /// Grow the tree to hold leaf `index` (newly created slots blank),
    /// write the leaf and record it as unmerged on every occupied
    /// ancestor.
    pub fn add_leaf(&mut self, index: LeafIndex, key_package: KeyPackage) -> Result<(), TreeError> {
        log::debug!("Adding leaf {}", index.as_u32());
        self.with_working_copy(|tree| tree.add_leaf_inner(index, key_package))
    }

    fn add_leaf_inner(&mut self, index: LeafIndex, key_package: KeyPackage) -> Result<(), TreeError> {
        let leaf_node = NodeIndex::from(index);
        while self.nodes.len() < leaf_node.as_usize() + 1 {
            self.nodes.push(OptionalNode::blank());
        }
        self.nodes[leaf_node] = OptionalNode::new_leaf(key_package);

        // The new leaf has not been folded into any ancestor key yet.
        for v in treemath::direct_path(leaf_node, self.leaf_count()) {
            if let Some(ancestor) = self.nodes[v].node_mut() {
                ancestor.as_parent_mut()?.add_unmerged(index);
            }
        }

        self.set_hash_path(index)
    }

    /// Replace an occupied leaf with a new key package, blanking its
    /// entire direct path.
    pub fn update_leaf(&mut self, index: LeafIndex, key_package: KeyPackage) -> Result<(), TreeError> {
        self.leaf_in_tree(index)?;
        if self.nodes[NodeIndex::from(index)].is_blank() {
            return Err(TreeError::BlankLeaf);
        }
        log::debug!("Updating leaf {}", index.as_u32());
        self.with_working_copy(|tree| {
            tree.blank_path_nodes(index);
            tree.nodes[NodeIndex::from(index)] = OptionalNode::new_leaf(key_package);
            tree.set_hash_path(index)
        })
    }

    /// Blank the leaf and all of its ancestors, the root included. No-op
    /// on an empty tree.
    pub fn blank_path(&mut self, index: LeafIndex) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.leaf_in_tree(index)?;
        self.with_working_copy(|tree| {
            tree.blank_path_nodes(index);
            tree.set_hash_path(index)
        })
    }

    fn blank_path_nodes(&mut self, index: LeafIndex) {
        let size = self.leaf_count();
        let root = self.root_index();
        let mut curr = NodeIndex::from(index);
        while curr != root {
            self.nodes[curr].set_to_blank();
            curr = treemath::parent(curr, size);
        }
        self.nodes[root].set_to_blank();
    }

    /// Replace the key package of an occupied leaf in place. Hashes are
    /// not recomputed; callers batching several writes follow up with
    /// [`RatchetTree::set_hash_all`].
    pub fn set_leaf(&mut self, index: LeafIndex, key_package: KeyPackage) -> Result<(), TreeError> {
        self.leaf_in_tree(index)?;
        let node = self.nodes[NodeIndex::from(index)]
            .node_mut()
            .ok_or(TreeError::BlankLeaf)?;
        *node.as_leaf_mut()? = key_package;
        Ok(())
    }

    /// Attach the private init key to an occupied leaf.
    pub fn set_leaf_private_key(
        &mut self,
        index: LeafIndex,
        private_key: HpkePrivateKey,
    ) -> Result<(), TreeError> {
        self.leaf_in_tree(index)?;
        let node = self.nodes[NodeIndex::from(index)]
            .node_mut()
            .ok_or(TreeError::BlankLeaf)?;
        node.as_leaf_mut()?.set_private_key(private_key);
        Ok(())
    }

    // === Key agreement ===

    /// Derive path secrets up the direct path of `from`, rewrite the
    /// parents along that path with fresh key pairs and encrypt each path
    /// secret to the resolution of the corresponding co-path subtree.
    /// Returns the published path and the root secret.
    pub fn encap(
        &mut self,
        from: LeafIndex,
        context: &[u8],
        leaf_secret: &[u8],
    ) -> Result<(DirectPath, Vec<u8>), TreeError> {
        self.leaf_in_tree(from)?;
        if self.nodes[NodeIndex::from(from)].is_blank() {
            return Err(TreeError::BlankLeaf);
        }
        log::debug!("Encap from leaf {}", from.as_u32());
        self.with_working_copy(|tree| tree.encap_inner(from, context, leaf_secret))
    }

    fn encap_inner(
        &mut self,
        from: LeafIndex,
        context: &[u8],
        leaf_secret: &[u8],
    ) -> Result<(DirectPath, Vec<u8>), TreeError> {
        let leaf_node = NodeIndex::from(from);
        let size = self.leaf_count();
        let mut secrets = self.path_secrets(leaf_node, leaf_secret)?;

        let mut direct_path = DirectPath { nodes: Vec::new() };
        for v in treemath::copath(leaf_node, size) {
            let parent = treemath::parent(v, size);
            let path_secret = &secrets[&parent];

            // The non-updated child's parent gets a key pair derived from
            // the freshly computed path secret.
            let parent_node = ParentNode::from_path_secret(self.ciphersuite, path_secret)?;
            let public_key = parent_node.public_key().clone();

            // Encrypt the path secret to the resolution of the co-path
            // subtree so every member below it can decrypt.
            let mut encrypted_path_secrets = Vec::new();
            for r in self.resolve(v) {
                let recipient_key = self.public_key_at(r)?.clone();
                let ciphertext = self
                    .ciphersuite
                    .hpke_seal(&recipient_key, context, path_secret)?;
                encrypted_path_secrets.push(ciphertext);
            }

            self.nodes[parent] = OptionalNode::new_parent(parent_node);
            direct_path.nodes.push(DirectPathNode {
                public_key,
                encrypted_path_secrets,
            });
        }

        self.set_hash_path(from)?;

        let root_secret = secrets
            .remove(&self.root_index())
            .ok_or(TreeError::InvalidIndex)?;
        Ok((direct_path, root_secret))
    }

    /// Process a direct path published by the member at `from`: install
    /// the new public keys, decrypt the one path secret addressed to us
    /// and implant it from the overlap up to the root. Returns the root
    /// secret.
    pub fn decap(
        &mut self,
        from: LeafIndex,
        context: &[u8],
        path: &DirectPath,
    ) -> Result<Vec<u8>, TreeError> {
        self.leaf_in_tree(from)?;
        log::debug!("Decap of a path from leaf {}", from.as_u32());
        self.with_working_copy(|tree| tree.decap_inner(from, context, path))
    }

    fn decap_inner(
        &mut self,
        from: LeafIndex,
        context: &[u8],
        path: &DirectPath,
    ) -> Result<Vec<u8>, TreeError> {
        let leaf_node = NodeIndex::from(from);
        let direct_path = treemath::direct_path(leaf_node, self.leaf_count());
        if path.nodes.len() != direct_path.len() {
            log::error!(
                "Direct path length mismatch: got {}, expected {}",
                path.nodes.len(),
                direct_path.len()
            );
            return Err(TreeError::Malformed);
        }

        for (path_node, &node_index) in path.nodes.iter().zip(direct_path.iter()) {
            self.nodes[node_index].merge_public(path_node.public_key.clone())?;
        }

        let (overlap, path_secret) = self.decrypt_path_secret(from, context, path)?;
        let root_secret = self.implant_inner(overlap, &path_secret)?;
        self.set_hash_path(from)?;
        Ok(root_secret)
    }

    /// Find the one ciphertext addressed to a key we hold on the sender's
    /// co-path and decrypt it. Returns the overlap node (the parent of the
    /// co-path entry) and the decrypted path secret.
    fn decrypt_path_secret(
        &self,
        from: LeafIndex,
        context: &[u8],
        path: &DirectPath,
    ) -> Result<(NodeIndex, Vec<u8>), TreeError> {
        let size = self.leaf_count();
        let copath = treemath::copath(NodeIndex::from(from), size);
        if path.nodes.len() != copath.len() {
            return Err(TreeError::Malformed);
        }

        for (path_node, &curr) in path.nodes.iter().zip(copath.iter()) {
            let resolution = self.resolve(curr);
            if path_node.encrypted_path_secrets.len() != resolution.len() {
                log::error!(
                    "Resolution length mismatch at node {}: got {}, expected {}",
                    curr.as_u32(),
                    path_node.encrypted_path_secrets.len(),
                    resolution.len()
                );
                return Err(TreeError::Malformed);
            }

            for (ciphertext, &r) in path_node.encrypted_path_secrets.iter().zip(resolution.iter()) {
                let private_key = match self.nodes[r].node().and_then(Node::private_key) {
                    Some(private_key) => private_key,
                    None => continue,
                };
                let path_secret = self.ciphersuite.hpke_open(ciphertext, private_key, context)?;
                return Ok((treemath::parent(curr, size), path_secret));
            }
        }

        Err(TreeError::NoDecryptionKey)
    }

    /// Derive path secrets from `start` to the root and attach the
    /// resulting private keys, checking at every step that the derived
    /// public key matches the one already in the tree. Returns the root
    /// secret.
    pub fn implant(&mut self, start: NodeIndex, path_secret: &[u8]) -> Result<Vec<u8>, TreeError> {
        self.with_working_copy(|tree| tree.implant_inner(start, path_secret))
    }

    /// [`RatchetTree::implant`] starting at the lowest common ancestor of
    /// two leaves.
    pub fn implant_from(
        &mut self,
        from: LeafIndex,
        to: LeafIndex,
        path_secret: &[u8],
    ) -> Result<Vec<u8>, TreeError> {
        self.implant(treemath::ancestor(from, to), path_secret)
    }

    fn implant_inner(&mut self, start: NodeIndex, path_secret: &[u8]) -> Result<Vec<u8>, TreeError> {
        let secrets = self.path_secrets(start, path_secret)?;
        let ciphersuite = self.ciphersuite;

        for (&node_index, secret) in &secrets {
            let keypair = ciphersuite.derive_hpke_keypair(secret)?;
            let parent_node = self.nodes[node_index]
                .node_mut()
                .ok_or(TreeError::WrongNodeKind)?
                .as_parent_mut()?;
            if parent_node.public_key() != keypair.public_key() {
                log::error!(
                    "Implanted secret derives a different public key at node {}",
                    node_index.as_u32()
                );
                return Err(TreeError::PublicKeyMismatch);
            }
            parent_node.set_private_key(keypair.into_keys().0);
        }

        secrets
            .get(&self.root_index())
            .cloned()
            .ok_or(TreeError::InvalidIndex)
    }

    /// Chain path secrets from `start` up to and including the root,
    /// seeding the chain with `path_secret`.
    pub fn path_secrets(
        &self,
        start: NodeIndex,
        path_secret: &[u8],
    ) -> Result<BTreeMap<NodeIndex, Vec<u8>>, TreeError> {
        if start.as_usize() >= self.nodes.len() {
            return Err(TreeError::InvalidIndex);
        }

        let size = self.leaf_count();
        let root = self.root_index();
        let mut secrets = BTreeMap::new();

        let mut curr = start;
        secrets.insert(curr, path_secret.to_vec());
        while curr != root {
            let next = treemath::parent(curr, size);
            let derived = self.path_step(&secrets[&curr])?;
            secrets.insert(next, derived);
            curr = next;
        }

        Ok(secrets)
    }

    // One link of the KDF chain.
    fn path_step(&self, path_secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.ciphersuite
            .hkdf_expand_label(path_secret, "path", &[], self.ciphersuite.secret_size())
    }

    /// The ordered list of occupied nodes that collectively cover the
    /// subtree of `index` for encryption purposes.
    pub(crate) fn resolve(&self, index: NodeIndex) -> Vec<NodeIndex> {
        match self.nodes[index].node() {
            // Resolution of an occupied node is the node itself plus its
            // unmerged leaves.
            Some(node) => {
                let mut resolution = vec![index];
                if let Node::Parent(parent_node) = node {
                    resolution.extend(
                        parent_node
                            .unmerged_leaves()
                            .iter()
                            .map(|&leaf_index| NodeIndex::from(leaf_index)),
                    );
                }
                resolution
            }
            // Resolution of a blank leaf is empty.
            None if index.is_leaf() => vec![],
            // Resolution of a blank parent is the concatenation of the
            // children's resolutions.
            None => {
                let mut resolution = self.resolve(treemath::left(index));
                resolution.append(&mut self.resolve(treemath::right(index, self.leaf_count())));
                resolution
            }
        }
    }

    fn public_key_at(&self, index: NodeIndex) -> Result<&HpkePublicKey, TreeError> {
        self.nodes[index]
            .node()
            .map(Node::public_key)
            .ok_or(TreeError::InvalidIndex)
    }

    // === Queries ===

    /// The key package at an occupied leaf.
    pub fn key_package(&self, index: LeafIndex) -> Option<&KeyPackage> {
        self.nodes
            .get(NodeIndex::from(index).as_usize())?
            .node()?
            .as_leaf()
            .ok()
    }

    /// The first occupied leaf holding a key package structurally equal to
    /// `key_package`.
    pub fn find(&self, key_package: &KeyPackage) -> Option<LeafIndex> {
        for i in 0..self.leaf_count().as_usize() {
            let leaf_index = LeafIndex::from(i);
            if let Some(Node::Leaf(candidate)) = self.nodes[leaf_index].node() {
                if candidate == key_package {
                    return Some(leaf_index);
                }
            }
        }
        None
    }

    /// The lowest blank leaf slot, or the next index past the current
    /// size.
    pub fn leftmost_free(&self) -> LeafIndex {
        let size = self.leaf_count().as_u32();
        let mut curr = 0u32;
        while curr < size && !self.nodes[LeafIndex::from(curr)].is_blank() {
            curr += 1;
        }
        LeafIndex::from(curr)
    }

    /// The hash of the root node: the committed state of the whole tree.
    pub fn root_hash(&self) -> &[u8] {
        if self.nodes.is_empty() {
            return &[];
        }
        self.nodes[self.root_index()].hash()
    }

    /// Export the private keys held at occupied slots.
    pub fn get_secrets(&self) -> TreeSecrets {
        let mut private_keys = BTreeMap::new();
        for (i, slot) in self.nodes.iter().enumerate() {
            if let Some(private_key) = slot.node().and_then(Node::private_key) {
                private_keys.insert(NodeIndex::from(i), private_key.clone());
            }
        }
        TreeSecrets { private_keys }
    }

    /// Attach imported private keys to their occupied slots.
    pub fn set_secrets(&mut self, secrets: TreeSecrets) -> Result<(), TreeError> {
        self.with_working_copy(|tree| {
            for (node_index, private_key) in secrets.private_keys {
                tree.nodes
                    .get_mut(node_index.as_usize())
                    .ok_or(TreeError::InvalidIndex)?
                    .node_mut()
                    .ok_or(TreeError::InvalidIndex)?
                    .set_private_key(private_key);
            }
            Ok(())
        })
    }

    // === Hashing ===

    fn set_hash(&mut self, index: NodeIndex) -> Result<(), TreeError> {
        let ciphersuite = self.ciphersuite;
        if index.is_leaf() {
            let leaf_index = LeafIndex::try_from(index)?;
            return self.nodes[index].set_leaf_hash(ciphersuite, leaf_index);
        }
        let left_hash = self.nodes[treemath::left(index)].hash().to_vec();
        let right_hash = self.nodes[treemath::right(index, self.leaf_count())]
            .hash()
            .to_vec();
        self.nodes[index].set_parent_hash(ciphersuite, index, &left_hash, &right_hash)
    }

    // Recompute the cached hashes from a leaf up to the root inclusive.
    fn set_hash_path(&mut self, index: LeafIndex) -> Result<(), TreeError> {
        let size = self.leaf_count();
        let root = self.root_index();
        let mut curr = NodeIndex::from(index);
        loop {
            self.set_hash(curr)?;
            if curr == root {
                return Ok(());
            }
            curr = treemath::parent(curr, size);
        }
    }

    fn set_hash_subtree(&mut self, index: NodeIndex) -> Result<(), TreeError> {
        if index.is_leaf() {
            return self.set_hash(index);
        }
        self.set_hash_subtree(treemath::left(index))?;
        self.set_hash_subtree(treemath::right(index, self.leaf_count()))?;
        self.set_hash(index)
    }

    /// Recompute every cached hash by a post-order traversal.
    pub fn set_hash_all(&mut self) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.set_hash_subtree(self.root_index())
    }
}
