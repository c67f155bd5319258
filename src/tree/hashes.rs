//! Tree hash inputs.
//!
//! ```text
//! struct {
//!     uint32 leaf_index;
//!     optional<KeyPackage> key_package;
//! } LeafNodeHashInput;
//!
//! struct {
//!     uint32 node_index;
//!     optional<ParentNode> parent_node;
//!     opaque left_hash<0..255>;
//!     opaque right_hash<0..255>;
//! } ParentNodeHashInput;
//! ```
//!
//! The hash of a slot covers the wire encoding of its content (blank slots
//! hash as absent), so two trees with equal content hash equally no matter
//! how they were produced.

use super::index::{LeafIndex, NodeIndex};
use super::node::ParentNode;
use crate::ciphersuite::CipherSuite;
use crate::codec::{encode_vec, CodecError, Encode, VecSize};
use crate::key_packages::KeyPackage;

pub(crate) struct LeafNodeHashInput<'a> {
    leaf_index: LeafIndex,
    key_package: Option<&'a KeyPackage>,
}

impl<'a> LeafNodeHashInput<'a> {
    pub(crate) fn new(leaf_index: LeafIndex, key_package: Option<&'a KeyPackage>) -> Self {
        Self {
            leaf_index,
            key_package,
        }
    }

    pub(crate) fn hash(&self, ciphersuite: CipherSuite) -> Result<Vec<u8>, CodecError> {
        Ok(ciphersuite.hash(&self.encode_detached()?))
    }
}

impl Encode for LeafNodeHashInput<'_> {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.leaf_index.as_u32().encode(buffer)?;
        self.key_package.encode(buffer)
    }
}

pub(crate) struct ParentNodeHashInput<'a> {
    node_index: NodeIndex,
    parent_node: Option<&'a ParentNode>,
    left_hash: &'a [u8],
    right_hash: &'a [u8],
}

impl<'a> ParentNodeHashInput<'a> {
    pub(crate) fn new(
        node_index: NodeIndex,
        parent_node: Option<&'a ParentNode>,
        left_hash: &'a [u8],
        right_hash: &'a [u8],
    ) -> Self {
        Self {
            node_index,
            parent_node,
            left_hash,
            right_hash,
        }
    }

    pub(crate) fn hash(&self, ciphersuite: CipherSuite) -> Result<Vec<u8>, CodecError> {
        Ok(ciphersuite.hash(&self.encode_detached()?))
    }
}

impl Encode for ParentNodeHashInput<'_> {
    fn encode(&self, buffer: &mut Vec<u8>) -> Result<(), CodecError> {
        self.node_index.as_u32().encode(buffer)?;
        self.parent_node.encode(buffer)?;
        encode_vec(VecSize::VecU8, buffer, self.left_hash)?;
        encode_vec(VecSize::VecU8, buffer, self.right_hash)
    }
}
