//! Memoization for values derived from the dataset.
//!
//! The core recomputes everything on demand; front-ends that show the same
//! puzzle repeatedly keep the results here instead.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct MemoCache<K, V> {
    entries: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<K: Eq + Hash, V> MemoCache<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `build` on first use.
    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> V) -> &V {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.misses += 1;
                entry.insert(build())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn hits(&self) -> usize {
        self.hits
    }

    pub const fn misses(&self) -> usize {
        self.misses
    }
}
