use super::node::{Node, Removal};
use crate::{
    key_value::KeyValue,
    walk::{NodeInfo, NodeKind},
};
use std::borrow::Borrow;

/// Bucket of entries whose keys share a full hash.
#[derive(Clone, Debug)]
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

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
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

impl<K: Clone + Eq, V: Clone> CollisionNode<K, V> {
    /// Inserts an entry with the same hash as this bucket.
    pub fn insert(&self, key_value: KeyValue<K, V>) -> (Node<K, V>, bool) {
        let mut entries = self.entries.clone();

        let added = match self.find_index(key_value.hash(), key_value.key()) {
            Some(index) => {
                entries[index] = key_value;
                false
            }
            None => {
                entries.push(key_value);
                true
            }
        };

        (Node::Collision(Self::new(self.hash, entries)), added)
    }

    pub fn remove<Q: Eq + ?Sized>(&self, hash: u64, key: &Q) -> Removal<Node<K, V>>
    where
        K: Borrow<Q>,
    {
        match self.find_index(hash, key) {
            None => Removal::NotFound,
            Some(_) if self.entries.len() == 1 => Removal::Emptied,
            Some(index) => {
                let mut entries = self.entries.clone();

                entries.remove(index);

                Removal::Updated(Node::Collision(Self::new(self.hash, entries)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> CollisionNode<&'static str, usize> {
        CollisionNode::new(
            42,
            vec![KeyValue::new(42, "a", 1), KeyValue::new(42, "b", 2)],
        )
    }

    fn collision<'a>(
        node: &'a Node<&'static str, usize>,
    ) -> &'a CollisionNode<&'static str, usize> {
        match node {
            Node::Collision(node) => node,
            _ => panic!("expected collision node"),
        }
    }

    #[test]
    fn get() {
        let node = bucket();

        assert_eq!(node.get(42, &"a").map(KeyValue::value), Some(&1));
        assert_eq!(node.get(42, &"b").map(KeyValue::value), Some(&2));
        assert_eq!(node.get(42, &"c"), None);
        assert_eq!(node.get(0, &"a"), None);
    }

    #[test]
    fn insert() {
        let node = bucket();
        let (other, added) = node.insert(KeyValue::new(42, "c", 3));

        assert!(added);
        assert_eq!(node.len(), 2);
        assert_eq!(collision(&other).len(), 3);

        let (other, added) = collision(&other).insert(KeyValue::new(42, "a", 4));

        assert!(!added);
        assert_eq!(other.get(0, 42, &"a").map(KeyValue::value), Some(&4));
        assert_eq!(other.validate(0), 3);
    }

    #[test]
    fn remove() {
        let node = bucket();

        assert!(matches!(node.remove(42, &"c"), Removal::NotFound));
        assert!(matches!(node.remove(0, &"a"), Removal::NotFound));

        let Removal::Updated(other) = node.remove(42, &"a") else {
            panic!("expected update");
        };

        assert_eq!(collision(&other).entries(), &[KeyValue::new(42, "b", 2)]);
        assert!(matches!(collision(&other).remove(42, &"b"), Removal::Emptied));
    }
}
