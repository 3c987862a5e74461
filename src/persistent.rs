//! Persistent HAMT whose versions share structure.

mod array_node;
mod bitmap_node;
mod collision_node;
mod iter;
mod node;

pub use self::iter::{Iter, Keys, Values};
use self::node::{Node, Removal};
use crate::{
    error::{HamtError, Result},
    hasher::{DefaultKeyHasher, KeyHasher},
    key_value::KeyValue,
    walk::{NodeInfo, Nodes, Traversal},
};
use std::{borrow::Borrow, fmt, sync::Arc};

/// Persistent map of HAMT.
///
/// Note that every method does not modify the original map but creates a new
/// one if necessary. Only the nodes on the path to a change are copied; all
/// other subtrees are shared between the old and the new map, so cloning a
/// map and keeping old versions around is cheap.
///
/// A map may designate one key as its *null key*. That key is never hashed;
/// its value lives in a dedicated slot beside the trie.
#[derive(Clone)]
pub struct PersistentHamt<K, V, H = DefaultKeyHasher> {
    size: usize,
    root: Option<Arc<Node<K, V>>>,
    null_key: Option<K>,
    null_value: Option<V>,
    hasher: H,
}

impl<K, V> PersistentHamt<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_hasher(DefaultKeyHasher)
    }

    /// Creates an empty map storing `key` outside the trie.
    pub fn with_null_key(key: K) -> Self {
        Self::with_hasher_and_null_key(DefaultKeyHasher, key)
    }
}

impl<K, V, H> PersistentHamt<K, V, H> {
    /// Creates an empty map hashing keys with `hasher`.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            size: 0,
            root: None,
            null_key: None,
            null_value: None,
            hasher,
        }
    }

    /// Creates an empty map hashing keys with `hasher` and storing `key`
    /// outside the trie.
    pub fn with_hasher_and_null_key(hasher: H, key: K) -> Self {
        Self {
            null_key: Some(key),
            ..Self::with_hasher(hasher)
        }
    }

    /// Returns a size of a map.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if a map is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the designated null key, if any.
    pub fn null_key(&self) -> Option<&K> {
        self.null_key.as_ref()
    }

    /// Returns entries in a map.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(
            self.null_key.as_ref().zip(self.null_value.as_ref()),
            self.root.as_deref(),
            self.size,
        )
    }

    /// Returns keys in a map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Returns values in a map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Visits the internal nodes of the trie for structural inspection.
    pub fn nodes(&self, traversal: Traversal) -> impl Iterator<Item = NodeInfo> + '_ {
        Nodes::new(self.root.as_deref(), traversal)
    }

    /// Checks structural invariants and the cached size.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let count = self.root.as_ref().map_or(0, |root| root.validate(0));

        assert_eq!(self.root.as_ref().map_or(0, |root| root.size()), count);
        assert_eq!(count + self.null_value.is_some() as usize, self.size);
        assert_eq!(self.iter().count(), self.size);
    }

    /// Returns true if both maps share the same root node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(one), Some(other)) => Arc::ptr_eq(one, other),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<K: Eq, V, H> PersistentHamt<K, V, H> {
    fn is_null<Q: Eq + ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
    {
        self.null_key
            .as_ref()
            .is_some_and(|null| null.borrow() == key)
    }

    /// Finds an entry by key.
    pub fn get_key_value<Q: Eq + ?Sized>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        if self.is_null(key) {
            return self.null_key.as_ref().zip(self.null_value.as_ref());
        }

        self.root
            .as_ref()?
            .get(0, self.hasher.hash_key(key), key)
            .map(|key_value| (key_value.key(), key_value.value()))
    }

    /// Finds a value by key.
    pub fn get<Q: Eq + ?Sized>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Finds a value by key, falling back to `default`.
    pub fn get_or<'a, Q: Eq + ?Sized>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        self.get(key).unwrap_or(default)
    }

    /// Finds a value by key, failing with [`HamtError::NotFound`] if absent.
    pub fn try_get<Q: Eq + fmt::Debug + ?Sized>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        self.get(key).ok_or_else(|| HamtError::not_found(key))
    }

    /// Checks if a key is contained in a map.
    pub fn contains_key<Q: Eq + ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        self.get_key_value(key).is_some()
    }
}

impl<K: Clone + Eq, V: Clone, H: Clone + KeyHasher<K>> PersistentHamt<K, V, H> {
    /// Inserts a key-value pair into a map.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        self.insert_with_status(key, value).0
    }

    /// Inserts a key-value pair into a map, also reporting whether the key
    /// was not present before.
    #[must_use]
    pub fn insert_with_status(&self, key: K, value: V) -> (Self, bool) {
        if self.is_null(&key) {
            let added = self.null_value.is_none();

            return (
                Self {
                    size: self.size + added as usize,
                    null_value: Some(value),
                    ..self.clone()
                },
                added,
            );
        }

        let key_value = KeyValue::new(self.hasher.hash_key(&key), key, value);
        let (root, added) = match &self.root {
            Some(root) => Node::insert(root, 0, key_value),
            None => Node::insert(&Arc::new(Node::new()), 0, key_value),
        };

        (
            Self {
                size: self.size + added as usize,
                root: Some(root.into()),
                ..self.clone()
            },
            added,
        )
    }

    /// Removes a key from a map if any.
    #[must_use]
    pub fn remove<Q: Eq + ?Sized>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        if self.is_null(key) {
            return match self.null_value {
                Some(_) => Self {
                    size: self.size - 1,
                    null_value: None,
                    ..self.clone()
                },
                None => self.clone(),
            };
        }

        let Some(root) = &self.root else {
            return self.clone();
        };

        match root.remove(0, self.hasher.hash_key(key), key) {
            Removal::NotFound => self.clone(),
            Removal::Emptied => Self {
                size: self.size - 1,
                root: None,
                ..self.clone()
            },
            Removal::Updated(root) => Self {
                size: self.size - 1,
                root: Some(root.into()),
                ..self.clone()
            },
        }
    }
}

impl<K, V> Default for PersistentHamt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq, V: Clone, H: Clone + Default + KeyHasher<K>> FromIterator<(K, V)>
    for PersistentHamt<K, V, H>
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterator: I) -> Self {
        let mut map = Self::with_hasher(H::default());

        for (key, value) in iterator {
            map = map.insert(key, value);
        }

        map
    }
}

impl<K: Eq, V: PartialEq, H: KeyHasher<K>> PartialEq for PersistentHamt<K, V, H> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Eq, V: Eq, H: KeyHasher<K>> Eq for PersistentHamt<K, V, H> {}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for PersistentHamt<K, V, H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, H> IntoIterator for &'a PersistentHamt<K, V, H> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
