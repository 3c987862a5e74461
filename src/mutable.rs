//! Mutable HAMT edited in place.

mod array_node;
mod bitmap_node;
mod collision_node;
mod iter;
mod node;

pub use self::iter::{Iter, Keys, Values};
use self::node::Node;
use crate::{
    error::{HamtError, Result},
    hasher::{DefaultKeyHasher, KeyHasher},
    key_value::KeyValue,
    walk::{NodeInfo, Nodes, Traversal},
};
use std::{borrow::Borrow, fmt};

/// Map of HAMT updated in place.
///
/// Every node is owned by exactly one parent, so updates restructure the
/// trie directly without copying. Use
/// [`PersistentHamt`](crate::PersistentHamt) to keep old versions around.
///
/// A map may designate one key as its *null key*. That key is never hashed;
/// its value lives in a dedicated slot beside the trie.
pub struct Hamt<K, V, H = DefaultKeyHasher> {
    size: usize,
    root: Option<Box<Node<K, V>>>,
    null_key: Option<K>,
    null_value: Option<V>,
    hasher: H,
}

impl<K, V> Hamt<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_hasher(DefaultKeyHasher)
    }

    /// Creates an empty map storing `key` outside the trie.
    pub fn with_null_key(key: K) -> Self {
        Self::with_hasher_and_null_key(DefaultKeyHasher, key)
    }
}

impl<K, V, H> Hamt<K, V, H> {
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

    /// Removes every entry, keeping the null key designation.
    pub fn clear(&mut self) {
        self.size = 0;
        self.root = None;
        self.null_value = None;
    }

    /// Checks structural invariants and the cached size.
    #[cfg(test)]
    pub(crate) fn validate(&self) {
        let count = self.root.as_ref().map_or(0, |root| root.validate(0));

        assert_eq!(self.root.as_ref().map_or(0, |root| root.size()), count);
        assert_eq!(count + self.null_value.is_some() as usize, self.size);
        assert_eq!(self.iter().count(), self.size);
    }
}

impl<K: Eq, V, H> Hamt<K, V, H> {
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

    /// Finds a value by key for modification.
    pub fn get_mut<Q: Eq + ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        if self.is_null(key) {
            return self.null_value.as_mut();
        }

        let hash = self.hasher.hash_key(key);

        self.root
            .as_mut()?
            .get_mut(0, hash, key)
            .map(KeyValue::value_mut)
    }

    /// Removes a key from a map, returning its entry if any.
    pub fn remove_entry<Q: Eq + ?Sized>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        H: KeyHasher<Q>,
    {
        if self.is_null(key) {
            let value = self.null_value.take()?;
            self.size -= 1;

            return self.null_key.clone().map(|key| (key, value));
        }

        let hash = self.hasher.hash_key(key);
        let root = self.root.as_mut()?;
        let key_value = root.remove(0, hash, key)?;

        if root.is_empty() {
            self.root = None;
        }

        self.size -= 1;

        Some(key_value.into_pair())
    }
}

impl<K: Eq, V, H: KeyHasher<K>> Hamt<K, V, H> {
    /// Inserts a key-value pair into a map, returning the previous value of
    /// the key if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.is_null(&key) {
            let old = self.null_value.replace(value);
            self.size += old.is_none() as usize;

            return old;
        }

        let key_value = KeyValue::new(self.hasher.hash_key(&key), key, value);
        let old = self
            .root
            .get_or_insert_with(|| Box::new(Node::new()))
            .insert(0, key_value);

        self.size += old.is_none() as usize;

        old
    }

    /// Removes a key from a map, returning its value if any.
    pub fn remove<Q: Eq + ?Sized>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        H: KeyHasher<Q>,
    {
        if self.is_null(key) {
            let value = self.null_value.take()?;
            self.size -= 1;

            return Some(value);
        }

        let hash = self.hasher.hash_key(key);
        let root = self.root.as_mut()?;
        let (_, value) = root.remove(0, hash, key)?.into_pair();

        if root.is_empty() {
            self.root = None;
        }

        self.size -= 1;

        Some(value)
    }
}

impl<K, V> Default for Hamt<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq, V, H: KeyHasher<K>> Extend<(K, V)> for Hamt<K, V, H> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iterator: I) {
        for (key, value) in iterator {
            self.insert(key, value);
        }
    }
}

impl<K: Eq, V, H: Default + KeyHasher<K>> FromIterator<(K, V)> for Hamt<K, V, H> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iterator: I) -> Self {
        let mut map = Self::with_hasher(H::default());

        map.extend(iterator);

        map
    }
}

impl<K: Eq, V: PartialEq, H: KeyHasher<K>> PartialEq for Hamt<K, V, H> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Eq, V: Eq, H: KeyHasher<K>> Eq for Hamt<K, V, H> {}

impl<K: Clone + Eq, V: Clone, H: Clone + KeyHasher<K>> Clone for Hamt<K, V, H> {
    fn clone(&self) -> Self {
        let mut map = Self {
            size: 0,
            root: None,
            null_key: self.null_key.clone(),
            null_value: None,
            hasher: self.hasher.clone(),
        };

        map.extend(
            self.iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        map
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for Hamt<K, V, H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, H> IntoIterator for &'a Hamt<K, V, H> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, H> From<Hamt<K, V, H>> for crate::PersistentHamt<K, V, H>
where
    K: Clone + Eq,
    V: Clone,
    H: Clone + KeyHasher<K>,
{
    fn from(map: Hamt<K, V, H>) -> Self {
        let mut persistent = match &map.null_key {
            Some(key) => Self::with_hasher_and_null_key(map.hasher.clone(), key.clone()),
            None => Self::with_hasher(map.hasher.clone()),
        };

        for (key, value) in &map {
            persistent = persistent.insert(key.clone(), value.clone());
        }

        persistent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{hasher::FnKeyHasher, walk::NodeKind, PersistentHamt};
    use rand::{random, rng, seq::SliceRandom};
    use std::collections::HashMap;

    const ITERATION_COUNT: usize = 1 << 12;

    fn letters() -> Hamt<&'static str, usize, FnKeyHasher<fn(&&'static str) -> u64>> {
        fn hash(key: &&'static str) -> u64 {
            match *key {
                "a" => 0,
                "b" => 1,
                "c" => 32,
                _ => 7,
            }
        }

        Hamt::with_hasher(FnKeyHasher::new(hash as fn(&&'static str) -> u64))
    }

    #[test]
    fn new() {
        let map = Hamt::<usize, usize>::new();

        assert!(map.is_empty());
        assert_eq!(map.nodes(Traversal::DepthFirst).count(), 0);
    }

    #[test]
    fn insert() {
        let mut map = Hamt::new();

        assert_eq!(map.insert(0, 0), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.insert(0, 1), Some(0));
        assert_eq!(map.len(), 1);
        assert_eq!(map.insert(1, 0), None);
        assert_eq!(map.len(), 2);
        map.validate();
    }

    #[test]
    fn insert_many_in_order() {
        let mut map = Hamt::new();

        for index in 0..ITERATION_COUNT {
            map.insert(index, index);
            assert_eq!(map.len(), index + 1);
        }

        map.validate();
    }

    #[test]
    fn insert_many_at_random() {
        let mut map = Hamt::<u64, u64>::new();
        let mut reference = HashMap::new();

        for _ in 0..ITERATION_COUNT {
            let key = random();

            assert_eq!(map.insert(key, key), reference.insert(key, key));
            assert_eq!(map.len(), reference.len());
        }

        map.validate();
    }

    #[test]
    fn remove() {
        let mut map = Hamt::new();

        assert_eq!(map.remove(&0), None);

        map.insert(0, 10);
        map.insert(1, 11);

        assert_eq!(map.remove(&2), None);
        assert_eq!(map.remove(&0), Some(10));
        assert_eq!(map.remove(&0), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove_entry(&1), Some((1, 11)));
        assert!(map.is_empty());
        assert_eq!(map.nodes(Traversal::DepthFirst).count(), 0);
        map.validate();
    }

    #[test]
    fn insert_remove_many() {
        let mut map = Hamt::<i16, i16>::new();
        let mut reference = HashMap::new();

        for _ in 0..ITERATION_COUNT {
            let key = random();

            if random() {
                assert_eq!(map.insert(key, key), reference.insert(key, key));
                assert_eq!(map.get(&key), Some(&key));
            } else {
                assert_eq!(map.remove(&key), reference.remove(&key));
                assert_eq!(map.get(&key), None);
            }

            assert_eq!(map.len(), reference.len());
        }

        map.validate();
    }

    #[test]
    fn get() {
        let mut map = Hamt::new();

        map.insert(0, 0);

        assert_eq!(map.get(&0), Some(&0));
        assert_eq!(map.get(&1), None);
        assert_eq!(map.get_key_value(&0), Some((&0, &0)));
        assert_eq!(map.get_or(&1, &42), &42);
    }

    #[test]
    fn get_borrowed() {
        let mut map = Hamt::new();

        map.insert("foo".to_string(), 42);

        assert_eq!(map.get("foo"), Some(&42));
        assert!(map.contains_key("foo"));
        assert_eq!(map.remove("foo"), Some(42));
    }

    #[test]
    fn get_mut() {
        let mut map = Hamt::new();

        map.insert(1, 1);

        if let Some(value) = map.get_mut(&1) {
            *value += 10;
        }

        assert_eq!(map.get(&1), Some(&11));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn try_get() {
        let mut map = Hamt::new();

        map.insert("foo", 1);

        assert_eq!(map.try_get(&"foo"), Ok(&1));
        assert_eq!(
            map.try_get(&"bar"),
            Err(HamtError::NotFound {
                key: "\"bar\"".into()
            })
        );
    }

    #[test]
    fn fragment_collision() {
        let mut map = letters();

        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("c", 3);

        assert_eq!(map.get(&"a"), Some(&1));
        assert_eq!(map.get(&"b"), Some(&2));
        assert_eq!(map.get(&"c"), Some(&3));
        assert_eq!(map.nodes(Traversal::DepthFirst).count(), 2);
        map.validate();

        assert_eq!(map.remove(&"a"), Some(1));
        assert_eq!(map.get(&"c"), Some(&3));
        map.validate();
    }

    #[test]
    fn full_hash_collision() {
        let mut map = letters();

        map.insert("x", 1);
        map.insert("y", 2);
        map.insert("z", 3);

        assert_eq!(map.len(), 3);
        assert!(map
            .nodes(Traversal::DepthFirst)
            .any(|info| info.kind == NodeKind::Collision && info.occupancy == 3));
        map.validate();

        assert_eq!(map.insert("y", 4), Some(2));
        assert_eq!(map.remove(&"y"), Some(4));
        assert_eq!(map.get(&"x"), Some(&1));
        assert_eq!(map.get(&"z"), Some(&3));
        map.validate();

        assert_eq!(map.remove(&"x"), Some(1));
        assert_eq!(map.remove(&"z"), Some(3));
        assert!(map.is_empty());
        map.validate();
    }

    #[test]
    fn collision_node_wrapped_by_different_hash() {
        let hasher = FnKeyHasher::new(|key: &u64| if *key < 2 { 0 } else { *key });
        let mut map = Hamt::with_hasher(hasher);

        map.extend([(0, 0), (1, 1), (32, 32), (1024, 1024)]);

        for key in [0, 1, 32, 1024] {
            assert_eq!(map.get(&key), Some(&key));
        }

        assert_eq!(
            map.nodes(Traversal::DepthFirst)
                .map(|info| info.shift)
                .max(),
            Some(15)
        );
        map.validate();

        for key in [1024, 32, 0, 1] {
            assert_eq!(map.remove(&key), Some(key));
            map.validate();
        }
    }

    #[test]
    fn promote_and_demote() {
        let mut map = Hamt::with_hasher(FnKeyHasher::new(|key: &u64| *key));

        map.extend((0..32).map(|key| (key, key)));

        assert_eq!(
            map.nodes(Traversal::DepthFirst).next().map(|info| info.kind),
            Some(NodeKind::Array)
        );
        map.validate();

        for key in 0..28 {
            assert_eq!(map.remove(&key), Some(key));
            map.validate();
        }

        assert_eq!(
            map.nodes(Traversal::DepthFirst).next().map(|info| info.kind),
            Some(NodeKind::Bitmap)
        );

        for key in 28..32 {
            assert_eq!(map.get(&key), Some(&key));
        }
    }

    #[test]
    fn null_key() {
        let mut map = Hamt::with_null_key("");

        assert_eq!(map.get(&""), None);
        assert_eq!(map.insert("", 1), None);
        assert_eq!(map.insert("a", 2), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().next(), Some((&"", &1)));
        assert_eq!(map.insert("", 3), Some(1));
        assert_eq!(map.len(), 2);
        map.validate();

        if let Some(value) = map.get_mut(&"") {
            *value += 1;
        }

        assert_eq!(map.remove_entry(&""), Some(("", 4)));
        assert_eq!(map.remove(&""), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.null_key(), Some(&""));
        map.validate();
    }

    #[test]
    fn clear() {
        let mut map = Hamt::with_null_key(0);

        map.extend((0..100).map(|key| (key, key)));
        map.clear();

        assert!(map.is_empty());
        assert_eq!(map.get(&0), None);
        assert_eq!(map.null_key(), Some(&0));
        map.validate();
    }

    #[test]
    fn equality() {
        for _ in 0..8 {
            let mut maps: [Hamt<i16, i16>; 2] = [Hamt::new(), Hamt::new()];
            let mut inserted_keys: Vec<i16> = (0..ITERATION_COUNT).map(|_| random()).collect();
            let mut deleted_keys: Vec<i16> = (0..ITERATION_COUNT).map(|_| random()).collect();

            for map in maps.iter_mut() {
                inserted_keys.shuffle(&mut rng());
                deleted_keys.shuffle(&mut rng());

                for key in &inserted_keys {
                    map.insert(*key, *key);
                }

                for key in &deleted_keys {
                    map.remove(key);
                }
            }

            assert_eq!(maps[0], maps[1]);
        }
    }

    #[test]
    fn clone_is_independent() {
        let mut map = (0..100).map(|key| (key, key)).collect::<Hamt<_, _>>();
        let other = map.clone();

        map.insert(0, 42);
        map.remove(&1);

        assert_eq!(other.get(&0), Some(&0));
        assert_eq!(other.get(&1), Some(&1));
        assert_eq!(other.len(), 100);
        other.validate();
    }

    #[test]
    fn iterate() {
        let sizes = (0..42)
            .chain((0..100).map(|_| random::<u64>() % 1024))
            .collect::<Vec<_>>();

        for size in sizes {
            let mut map = Hamt::<i16, i16>::new();
            let mut reference = HashMap::new();

            for _ in 0..size {
                let key = random();
                let value = random();

                map.insert(key, value);
                reference.insert(key, value);
            }

            let mut count = 0;

            for (key, value) in &map {
                count += 1;

                assert_eq!(reference[key], *value);
            }

            assert_eq!(count, reference.len());
            assert_eq!(map.iter().len(), reference.len());
            assert_eq!(map.keys().count(), reference.len());
            assert_eq!(map.values().count(), reference.len());
        }
    }

    #[test]
    fn iterate_in_slot_order() {
        let mut map = Hamt::with_hasher(FnKeyHasher::new(|key: &u64| *key));

        map.extend([(33, 33), (2, 2), (1, 1)]);

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [1, 33, 2]);
    }

    #[test]
    fn walk_nodes() {
        let mut map = Hamt::with_hasher(FnKeyHasher::new(|key: &u64| *key));

        map.extend([0, 32, 1, 33, 1024, 1025].map(|key| (key, 0)));

        assert_eq!(
            map.nodes(Traversal::DepthFirst)
                .map(|info| info.shift)
                .collect::<Vec<_>>(),
            [0, 5, 10, 5, 10]
        );
        assert_eq!(
            map.nodes(Traversal::BreadthFirst)
                .map(|info| info.shift)
                .collect::<Vec<_>>(),
            [0, 5, 5, 10, 10]
        );
    }

    #[test]
    fn into_persistent() {
        let mut map = Hamt::with_null_key(0);

        map.extend((0..100).map(|key| (key, key)));

        let persistent = PersistentHamt::from(map);

        assert_eq!(persistent.len(), 100);
        assert_eq!(persistent.get(&0), Some(&0));
        assert_eq!(persistent.null_key(), Some(&0));
        persistent.validate();
    }

    #[test]
    fn debug() {
        let mut map = Hamt::new();

        map.insert(1, 2);

        assert_eq!(format!("{map:?}"), "{1: 2}");
    }

    #[test]
    fn send_and_sync() {
        let map: Hamt<usize, usize> = Hamt::new();
        std::thread::spawn(move || map);
    }
}
