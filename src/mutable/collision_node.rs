use crate::{
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::{borrow::Borrow, mem};

#[derive(Debug)]
pub(crate) struct CollisionNode<K, V> {
    hash: u64,
    entries: Vec<KeyValue<K, V>>,
}

impl<K, V> CollisionNode<K, V> {
    pub fn new(hash: u64, entries: Vec<KeyValue<K, V>>) -> Self {
        Self { hash, entries }
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn entries(&self) -> &[KeyValue<K, V>] {
        &self.entries
    }

    /// Matches entries by their own hash, so a bucket synthesized past the
    /// hash width may hold several hashes.
    fn find_index<Q: Eq + ?Sized>(&self, hash: u64, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
    {
        self.entries
            .iter()
            .position(|key_value| key_value.hash() == hash && key_value.key().borrow() == key)
    }

    pub fn get<Q: Eq + ?Sized>(&self, hash: u64, key: &Q) -> Option<&KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.find_index(hash, key).map(|index| &self.entries[index])
    }

    pub fn get_mut<Q: Eq + ?Sized>(
        &mut self,
        hash: u64,
        key: &Q,
    ) -> Option<&mut KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.find_index(hash, key)
            .map(|index| &mut self.entries[index])
    }

    /// Removes an entry. A bucket keeps its shape down to one entry and is
    /// left empty after the last one.
    pub fn remove<Q: Eq + ?Sized>(&mut self, hash: u64, key: &Q) -> Option<KeyValue<K, V>>
    where
        K: Borrow<Q>,
    {
        self.find_index(hash, key)
            .map(|index| self.entries.remove(index))
    }

    pub fn info(&self, shift: u32) -> NodeInfo {
        NodeInfo {
            kind: NodeKind::Collision,
            shift,
            bitmap: None,
            occupancy: self.entries.len(),
            leaves: self.entries.len(),
            branches: 0,
        }
    }

    #[cfg(test)]
    pub fn validate(&self, shift: u32) -> usize {
        assert!(!self.entries.is_empty());
        assert!(
            shift >= crate::bitmap::HASH_BITS
                || self
                    .entries
                    .iter()
                    .all(|key_value| key_value.hash() == self.hash)
        );

        self.entries.len()
    }
}

impl<K: Eq, V> CollisionNode<K, V> {
    /// Inserts an entry with the same hash as this bucket.
    pub fn insert(&mut self, key_value: KeyValue<K, V>) -> Option<V> {
        match self.find_index(key_value.hash(), key_value.key()) {
            Some(index) => {
                let (_, value) = key_value.into_pair();

                Some(mem::replace(self.entries[index].value_mut(), value))
            }
            None => {
                self.entries.push(key_value);

                None
            }
        }
    }
}
