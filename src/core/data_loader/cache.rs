use std::collections::HashMap;
use std::hash::Hash;

/// Resolved values of one [DataLoader](super::DataLoader).
///
/// A `None` entry records a key that resolved successfully to "not found".
/// Keys whose resolution failed are never stored.
pub struct KeyedCache<K, V> {
    entries: HashMap<K, Option<V>>,
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<K: Eq + Hash, V: Clone> KeyedCache<K, V> {
    #[inline]
    pub fn get(&self, key: &K) -> Option<&Option<V>> {
        self.entries.get(key)
    }

    #[inline]
    pub fn insert(&mut self, key: K, value: Option<V>) {
        self.entries.insert(key, value);
    }

    /// Inserts `value` only if `key` is absent. Returns whether the insert
    /// happened.
    pub fn prime(&mut self, key: K, value: V) -> bool {
        match self.entries.entry(key) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Some(value));
                true
            }
        }
    }

    #[inline]
    pub fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_prime_only_when_absent() {
        let mut cache = KeyedCache::<String, u32>::default();

        assert!(cache.prime("a".into(), 1));
        assert!(!cache.prime("a".into(), 2));
        assert_eq!(cache.get(&"a".into()), Some(&Some(1)));
    }

    #[test]
    fn test_not_found_is_cached() {
        let mut cache = KeyedCache::<String, u32>::default();
        cache.insert("missing".into(), None);

        assert_eq!(cache.get(&"missing".into()), Some(&None));
        assert!(!cache.prime("missing".into(), 3));
    }

    #[test]
    fn test_remove() {
        let mut cache = KeyedCache::<u64, u64>::default();
        cache.insert(1, Some(10));
        cache.remove(&1);

        assert_eq!(cache.get(&1), None);
    }
}
