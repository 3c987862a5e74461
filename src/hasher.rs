use std::{
    collections::hash_map::{DefaultHasher, RandomState},
    fmt,
    hash::{BuildHasher, Hash, Hasher},
};

/// Source of the 64-bit hashes a trie is indexed by.
///
/// Implementations must be consistent with key equality: equal keys hash
/// equally. For borrowed lookups the hash of a `Q` must equal the hash of the
/// `K` it borrows from, the same contract as [`std::borrow::Borrow`].
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
}

/// Hashes keys through their [`Hash`] implementation with a fixed-key SipHash.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DefaultKeyHasher;

impl<K: Hash + ?Sized> KeyHasher<K> for DefaultKeyHasher {
    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = DefaultHasher::new();

        key.hash(&mut hasher);

        hasher.finish()
    }
}

impl<K: Hash + ?Sized> KeyHasher<K> for RandomState {
    fn hash_key(&self, key: &K) -> u64 {
        self.hash_one(key)
    }
}

/// Uses a function as the hash.
#[derive(Clone, Copy)]
pub struct FnKeyHasher<F>(F);

impl<F> FnKeyHasher<F> {
    pub fn new(function: F) -> Self {
        Self(function)
    }
}

impl<K: ?Sized, F: Fn(&K) -> u64> KeyHasher<K> for FnKeyHasher<F> {
    fn hash_key(&self, key: &K) -> u64 {
        (self.0)(key)
    }
}

impl<F> fmt::Debug for FnKeyHasher<F> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("FnKeyHasher")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hasher_is_deterministic() {
        assert_eq!(
            DefaultKeyHasher.hash_key("foo"),
            DefaultKeyHasher.hash_key("foo")
        );
        assert_ne!(
            DefaultKeyHasher.hash_key(&0u64),
            DefaultKeyHasher.hash_key(&1u64)
        );
    }

    #[test]
    fn borrowed_keys_hash_equally() {
        assert_eq!(
            DefaultKeyHasher.hash_key(&"foo".to_string()),
            DefaultKeyHasher.hash_key("foo")
        );

        let state = RandomState::new();

        assert_eq!(
            state.hash_key(&"foo".to_string()),
            state.hash_key("foo")
        );
    }

    #[test]
    fn function_hasher() {
        let hasher = FnKeyHasher::new(|key: &u64| key % 7);

        assert_eq!(hasher.hash_key(&15), 1);
        assert_eq!(format!("{hasher:?}"), "FnKeyHasher");
    }
}
