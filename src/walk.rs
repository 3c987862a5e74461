//! Structural introspection of trie nodes.

use crate::bitmap::BITS_PER_LEVEL;
use std::collections::VecDeque;

/// Order in which [`nodes`](crate::PersistentHamt::nodes) visits internal
/// nodes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Traversal {
    /// Pops the most recently discovered node first.
    #[default]
    DepthFirst,
    /// Pops the earliest discovered node first.
    BreadthFirst,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeKind {
    Bitmap,
    Array,
    Collision,
}

/// Summary of a single internal node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeInfo {
    pub kind: NodeKind,
    /// Hash bits consumed above this node.
    pub shift: u32,
    /// Occupancy mask of a bitmap node.
    pub bitmap: Option<u32>,
    /// Occupied slots of a bitmap node, recorded child count of an array node,
    /// or pairs in a collision node.
    pub occupancy: usize,
    /// Key/value pairs stored directly in this node.
    pub leaves: usize,
    /// Child nodes referenced from this node.
    pub branches: usize,
}

pub(crate) trait Inspect {
    fn info(&self, shift: u32) -> NodeInfo;
    fn children(&self) -> Vec<&Self>;
}

pub(crate) struct Nodes<'a, N> {
    pending: VecDeque<(&'a N, u32)>,
    traversal: Traversal,
}

impl<'a, N> Nodes<'a, N> {
    pub fn new(root: Option<&'a N>, traversal: Traversal) -> Self {
        Self {
            pending: root.into_iter().map(|node| (node, 0)).collect(),
            traversal,
        }
    }
}

impl<'a, N: Inspect> Iterator for Nodes<'a, N> {
    type Item = NodeInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, shift) = match self.traversal {
            Traversal::DepthFirst => self.pending.pop_back(),
            Traversal::BreadthFirst => self.pending.pop_front(),
        }?;

        self.pending.extend(
            node.children()
                .into_iter()
                .map(|child| (child, shift + BITS_PER_LEVEL)),
        );

        Some(node.info(shift))
    }
}
