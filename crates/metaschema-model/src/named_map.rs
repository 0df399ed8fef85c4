//! Insertion-ordered map used by registries and containers.
//!
//! Re-inserting an existing key replaces the value in its original
//! position, so iteration order always reflects first declaration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct NamedMap<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> NamedMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Insert or replace; returns the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&at) => Some(std::mem::replace(&mut self.entries[at].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone, V> Default for NamedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let mut m = NamedMap::new();
        m.insert("b", 1);
        m.insert("a", 2);
        m.insert("c", 3);
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), ["b", "a", "c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut m = NamedMap::new();
        m.insert("x", 1);
        m.insert("y", 2);
        assert_eq!(m.insert("x", 9), Some(1));
        assert_eq!(m.values().copied().collect::<Vec<_>>(), [9, 2]);
        assert_eq!(m.get(&"x"), Some(&9));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_missing_key() {
        let m: NamedMap<&str, i32> = NamedMap::default();
        assert!(m.get(&"nope").is_none());
        assert!(m.is_empty());
    }
}
