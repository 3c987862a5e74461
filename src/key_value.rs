/// Leaf entry together with the hash its key was inserted under.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue<K, V> {
    hash: u64,
    key: K,
    value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(hash: u64, key: K, value: V) -> Self {
        Self { hash, key, value }
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}
