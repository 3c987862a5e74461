use super::{array_node::ArrayNode, bitmap_node::BitmapNode, collision_node::CollisionNode};
use crate::{
    bitmap::{BITS_PER_LEVEL, HASH_BITS},
    key_value::KeyValue,
    walk::{Inspect, NodeInfo},
};
use std::{borrow::Borrow, sync::Arc};
use tracing::trace;

/// Immutable trie node. Once wrapped in an `Arc` a node is never modified;
/// updates build new nodes along the path to the change.
#[derive(Clone, Debug)]
pub(crate) enum Node<K, V> {
    Bitmap(BitmapNode<K, V>),
    Array(ArrayNode<K, V>),
    Collision(CollisionNode<K, V>),
}

#[derive(Clone, Debug)]
pub(crate) enum Slot<K, V> {
    Leaf(KeyValue<K, V>),
    Branch(Arc<Node<K, V>>),
}

/// Outcome of removing a key from a node.
#[derive(Debug)]
pub(crate) enum Removal<N> {
    /// The key was absent and the node is unchanged.
    NotFound,
    /// The key was the last one in the node.
    Emptied,
    /// The key was removed; the node is replaced by this one.
    Updated(N),
}

impl<K, V> Node<K, V> {
    pub const fn new() -> Self {
        Self::Bitmap(BitmapNode::new())
    }

    pub fn get<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Option<&KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        match self {
            Self::Bitmap(node) => node.get(shift, hash, key),
            Self::Array(node) => node.get(shift, hash, key),
            Self::Collision(node) => node.get(hash, key),
        }
    }

    /// Counts entries by walking the whole subtree.
    #[cfg(test)]
    pub fn size(&self) -> usize {
        match self {
            Self::Bitmap(node) => node.size(),
            Self::Array(node) => node.size(),
            Self::Collision(node) => node.len(),
        }
    }

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        match self {
            Self::Bitmap(node) => node.validate(shift),
            Self::Array(node) => node.validate(shift),
            Self::Collision(node) => node.validate(shift),
        }
    }
}

impl<K: Clone + Eq, V: Clone> Node<K, V> {
    /// Inserts an entry below `node`, returning the replacement node and
    /// whether the key is new.
    pub fn insert(node: &Arc<Self>, shift: u32, key_value: KeyValue<K, V>) -> (Self, bool) {
        match node.as_ref() {
            Self::Bitmap(bitmap) => bitmap.insert(shift, key_value),
            Self::Array(array) => array.insert(shift, key_value),
            // Past the hash width there are no fragments left to wrap under.
            Self::Collision(collision)
                if collision.hash() == key_value.hash() || shift >= HASH_BITS =>
            {
                collision.insert(key_value)
            }
            Self::Collision(collision) => {
                trace!(shift, hash = collision.hash(), "wrapping collision node");

                BitmapNode::wrap(shift, collision.hash(), node.clone())
                    .insert(shift, key_value)
            }
        }
    }

    pub fn remove<Q: Eq + ?Sized>(&self, shift: u32, hash: u64, key: &Q) -> Removal<Self>
    where
        K: Borrow<Q>,
    {
        match self {
            Self::Bitmap(node) => node.remove(shift, hash, key),
            Self::Array(node) => node.remove(shift, hash, key),
            Self::Collision(node) => node.remove(hash, key),
        }
    }

    /// Builds a subtree at `shift` holding two distinct keys whose fragments
    /// collided one level above.
    pub fn pair(shift: u32, first: KeyValue<K, V>, second: KeyValue<K, V>) -> Self {
        // Distinct 64-bit hashes separate by shift 60 inside a trie; a bucket
        // built past the width matches entries by their own hash.
        if first.hash() == second.hash() || shift >= HASH_BITS {
            trace!(shift, hash = first.hash(), "creating collision node");

            Self::Collision(CollisionNode::new(first.hash(), vec![first, second]))
        } else {
            BitmapNode::singleton(shift, first).insert(shift, second).0
        }
    }
}

impl<K, V> Inspect for Node<K, V> {
    fn info(&self, shift: u32) -> NodeInfo {
        match self {
            Self::Bitmap(node) => node.info(shift),
            Self::Array(node) => node.info(shift),
            Self::Collision(node) => node.info(shift),
        }
    }

    fn children(&self) -> Vec<&Self> {
        match self {
            Self::Bitmap(node) => node.children().collect(),
            Self::Array(node) => node.children().collect(),
            Self::Collision(_) => vec![],
        }
    }
}

pub(crate) const fn next_shift(shift: u32) -> u32 {
    shift + BITS_PER_LEVEL
}
