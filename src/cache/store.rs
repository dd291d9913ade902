//! Cache Store Module
//!
//! Mapping from request identity to prefetched response snapshots.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheKey, TagSet};

// == Cache Store ==
/// Storage for prefetched responses, at most one entry per key.
///
/// Pure storage: scheduling expiry is the scheduler's job.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the entry stored for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Set ==
    /// Stores an entry, replacing any entry for an equivalent key.
    pub fn set(&mut self, key: CacheKey, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key, entry)
    }

    // == Delete ==
    /// Removes and returns the entry for `key`.
    pub fn delete(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Has ==
    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    // == Entries ==
    /// Iterates over all `(key, entry)` pairs in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&CacheKey, &CacheEntry)> {
        self.entries.iter()
    }

    // == Tagged Keys ==
    /// Collects keys whose entries carry at least one of `tags`.
    pub fn keys_tagged(&self, tags: &TagSet) -> Vec<CacheKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.has_any_tag(tags))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
