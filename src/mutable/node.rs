use super::{array_node::ArrayNode, bitmap_node::BitmapNode, collision_node::CollisionNode};
use crate::{
    bitmap::{BITS_PER_LEVEL, HASH_BITS},
    key_value::KeyValue,
    walk::{Inspect, NodeInfo},
};
use std::{borrow::Borrow, mem};
use tracing::trace;

/// Trie node owned by exactly one parent and edited in place.
#[derive(Debug)]
pub(crate) enum Node<K, V> {
    Bitmap(BitmapNode<K, V>),
    Array(ArrayNode<K, V>),
    Collision(CollisionNode<K, V>),
}

#[derive(Debug)]
pub(crate) enum Slot<K, V> {
    Leaf(KeyValue<K, V>),
    Branch(Box<Node<K, V>>),
}

impl<K, V> Node<K, V> {
    pub const fn new() -> Self {
        Self::Bitmap(BitmapNode::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bitmap(node) => node.slots().is_empty(),
            Self::Array(node) => node.count() == 0,
            Self::Collision(node) => node.entries().is_empty(),
        }
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

    #[cfg(test)]
    pub fn size(&self) -> usize {
        match self {
            Self::Bitmap(node) => node.size(),
            Self::Array(node) => node.size(),
            Self::Collision(node) => node.entries().len(),
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

impl<K: Eq, V> Node<K, V> {
    pub fn get_mut<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<&mut KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        match self {
            Self::Bitmap(node) => node.get_mut(shift, hash, key),
            Self::Array(node) => node.get_mut(shift, hash, key),
            Self::Collision(node) => node.get_mut(hash, key),
        }
    }

    /// Inserts an entry, returning the previous value of its key.
    pub fn insert(&mut self, shift: u32, key_value: KeyValue<K, V>) -> Option<V> {
        match self {
            Self::Bitmap(node) if node.is_full(shift, key_value.hash()) => {
                trace!(shift, occupancy = node.slots().len(), "promoting bitmap node");

                let array = node.promote(shift);

                *self = Self::Array(array);
                self.insert(shift, key_value)
            }
            Self::Bitmap(node) => node.insert(shift, key_value),
            Self::Array(node) => node.insert(shift, key_value),
            // Past the hash width there are no fragments left to wrap under.
            Self::Collision(node) if node.hash() == key_value.hash() || shift >= HASH_BITS => {
                node.insert(key_value)
            }
            Self::Collision(node) => {
                trace!(shift, hash = node.hash(), "wrapping collision node");

                let hash = node.hash();
                let collision = mem::replace(self, Self::new());

                *self = Self::Bitmap(BitmapNode::wrap(shift, hash, Box::new(collision)));
                self.insert(shift, key_value)
            }
        }
    }

    /// Removes an entry. The node may be left empty, in which case its parent
    /// drops it.
    pub fn remove<Q: Eq + ?Sized>(
        &mut self,
        shift: u32,
        hash: u64,
        key: &Q,
    ) -> Option<KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        match self {
            Self::Bitmap(node) => node.remove(shift, hash, key),
            Self::Array(node) => {
                let key_value = node.remove(shift, hash, key)?;

                if node.is_sparse() {
                    trace!(shift, occupancy = node.count(), "demoting array node");

                    let bitmap = node.demote();

                    *self = Self::Bitmap(bitmap);
                }

                Some(key_value)
            }
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
            let mut node = Self::Bitmap(BitmapNode::singleton(shift, first));

            node.insert(shift, second);

            node
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
