//! Index types for the ratchet tree. Leaves are counted densely with
//! [`LeafIndex`]; [`NodeIndex`] addresses the flat node array in which
//! leaves sit at even positions and parents at odd positions.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use super::errors::TreeError;
use super::node::OptionalNode;

/// NodeIndex is an index to the nodes of a tree, both parent and leaf
/// nodes.
#[derive(
    Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Default, Serialize, Deserialize,
)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    pub fn is_leaf(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn is_parent(&self) -> bool {
        self.0 % 2 == 1
    }
}

impl From<u32> for NodeIndex {
    fn from(i: u32) -> NodeIndex {
        NodeIndex(i)
    }
}

impl From<usize> for NodeIndex {
    fn from(i: usize) -> NodeIndex {
        NodeIndex(i as u32)
    }
}

impl From<LeafIndex> for NodeIndex {
    fn from(leaf_index: LeafIndex) -> NodeIndex {
        NodeIndex(leaf_index.as_u32() * 2)
    }
}

/// LeafIndex is an index to the leaves of a tree.
#[derive(
    Debug, Default, Ord, PartialOrd, Hash, Eq, PartialEq, Copy, Clone, Serialize, Deserialize,
)]
pub struct LeafIndex(pub(crate) u32);

impl LeafIndex {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for LeafIndex {
    fn from(i: u32) -> LeafIndex {
        LeafIndex(i)
    }
}

impl From<usize> for LeafIndex {
    fn from(i: usize) -> LeafIndex {
        LeafIndex(i as u32)
    }
}

impl TryFrom<NodeIndex> for LeafIndex {
    type Error = TreeError;

    /// Odd node indices are parents and have no leaf counterpart.
    fn try_from(node_index: NodeIndex) -> Result<Self, Self::Error> {
        if node_index.is_parent() {
            Err(TreeError::InvalidIndex)
        } else {
            Ok(LeafIndex(node_index.as_u32() / 2))
        }
    }
}

/// The number of leaves in a tree.
#[derive(
    Debug, Default, Ord, PartialOrd, Hash, Eq, PartialEq, Copy, Clone, Serialize, Deserialize,
)]
pub struct LeafCount(pub(crate) u32);

impl LeafCount {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for LeafCount {
    fn from(i: u32) -> LeafCount {
        LeafCount(i)
    }
}

impl From<usize> for LeafCount {
    fn from(i: usize) -> LeafCount {
        LeafCount(i as u32)
    }
}

// === Index the node vector with NodeIndex and LeafIndex ===

impl Index<NodeIndex> for Vec<OptionalNode> {
    type Output = OptionalNode;

    fn index(&self, node_index: NodeIndex) -> &Self::Output {
        &self[node_index.as_usize()]
    }
}

impl IndexMut<NodeIndex> for Vec<OptionalNode> {
    fn index_mut(&mut self, node_index: NodeIndex) -> &mut Self::Output {
        &mut self[node_index.as_usize()]
    }
}

impl Index<LeafIndex> for Vec<OptionalNode> {
    type Output = OptionalNode;

    /// Indexing with a `LeafIndex` addresses the leaf's position in the
    /// flat node array.
    fn index(&self, leaf_index: LeafIndex) -> &Self::Output {
        &self[NodeIndex::from(leaf_index).as_usize()]
    }
}

impl IndexMut<LeafIndex> for Vec<OptionalNode> {
    fn index_mut(&mut self, leaf_index: LeafIndex) -> &mut Self::Output {
        &mut self[NodeIndex::from(leaf_index).as_usize()]
    }
}
