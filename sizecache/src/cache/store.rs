//! Thread-safe size store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::stats::{CacheStats, CacheStatsSnapshot};
use super::types::{CacheEntry, CacheKey};
use crate::item::ItemSize;

/// Thread-safe mapping from [`CacheKey`] to computed size.
///
/// Every entry carries the generation it was written in. Bulk invalidation
/// clears the map and bumps the generation, so a worker holding a stamp from
/// before the clear can never store its result afterwards
/// (see [`put_if_current`](Self::put_if_current)).
///
/// No operation fails: a missing key is an ordinary miss.
///
/// # Example
///
/// ```
/// use sizecache::cache::{CacheKey, CacheStore};
/// use sizecache::item::{DependencyMode, ItemPosition, ItemSize};
///
/// let store = CacheStore::new();
/// let key = CacheKey::from(ItemPosition::new(0, 3));
/// let size = ItemSize::new(375.0, 88.0, DependencyMode::Width);
///
/// let generation = store.generation();
/// store.invalidate_all();
///
/// // A result computed before the clear is rejected.
/// assert!(!store.put_if_current(key.clone(), size, generation));
/// assert_eq!(store.get(&key), None);
/// ```
#[derive(Debug, Default)]
pub struct CacheStore {
    inner: RwLock<StoreInner>,
    stats: CacheStats,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<CacheKey, CacheEntry>,
    generation: u64,
}

impl StoreInner {
    fn current(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries
            .get(key)
            .filter(|entry| entry.generation == self.generation)
    }
}

impl CacheStore {
    /// Creates an empty store at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached size for `key`, recording a hit or miss.
    pub fn get(&self, key: &CacheKey) -> Option<ItemSize> {
        let size = self.inner.read().current(key).map(|entry| entry.size);
        match size {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        size
    }

    /// Returns the entry for `key` without touching statistics.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.read().current(key).copied()
    }

    /// Returns true if `key` has a size in the current generation.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.read().current(key).is_some()
    }

    /// Stores `size` for `key` in the current generation, overwriting any
    /// previous value.
    pub fn put(&self, key: CacheKey, size: ItemSize) {
        let mut inner = self.inner.write();
        let generation = inner.generation;
        inner.entries.insert(key, CacheEntry { size, generation });
        self.stats.record_write();
    }

    /// Stores `size` only if `generation` is still current.
    ///
    /// The check and the write happen under one write lock. Returns false
    /// when the result was discarded as stale.
    pub fn put_if_current(&self, key: CacheKey, size: ItemSize, generation: u64) -> bool {
        let mut inner = self.inner.write();
        if inner.generation != generation {
            self.stats.record_stale_discard();
            return false;
        }
        inner.entries.insert(key, CacheEntry { size, generation });
        self.stats.record_write();
        true
    }

    /// Removes exactly the given keys. Returns how many were present.
    pub fn invalidate<'a, I>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a CacheKey>,
    {
        let mut inner = self.inner.write();
        let removed = keys
            .into_iter()
            .filter(|key| inner.entries.remove(*key).is_some())
            .count();
        self.stats.record_invalidations(removed as u64);
        removed
    }

    /// Clears every entry and bumps the generation. Returns the new generation.
    pub fn invalidate_all(&self) -> u64 {
        let mut inner = self.inner.write();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.generation += 1;
        self.stats.record_invalidations(removed as u64);
        inner.generation
    }

    /// Current generation stamp.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the store's statistics.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let (entries, generation) = {
            let inner = self.inner.read();
            (inner.entries.len(), inner.generation)
        };
        self.stats.snapshot(entries, generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{DependencyMode, ItemPosition};
    use std::sync::Arc;
    use std::thread;

    fn key(index: usize) -> CacheKey {
        CacheKey::from(ItemPosition::new(0, index))
    }

    fn size(height: f64) -> ItemSize {
        ItemSize::new(320.0, height, DependencyMode::Width)
    }

    #[test]
    fn test_get_missing_key_is_a_miss() {
        let store = CacheStore::new();
        assert_eq!(store.get(&key(1)), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_put_overwrites() {
        let store = CacheStore::new();
        store.put(key(1), size(44.0));
        store.put(key(1), size(88.0));

        assert_eq!(store.get(&key(1)), Some(size(88.0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_invalidate_removes_only_given_keys() {
        let store = CacheStore::new();
        for i in 0..5 {
            store.put(key(i), size(i as f64 + 1.0));
        }

        let removed = store.invalidate(&[key(1), key(3), key(42)]);

        assert_eq!(removed, 2);
        assert_eq!(store.len(), 3);
        assert!(store.contains(&key(0)));
        assert!(!store.contains(&key(1)));
        assert!(store.contains(&key(2)));
        assert!(!store.contains(&key(3)));
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_invalidate_all_clears_and_bumps_generation() {
        let store = CacheStore::new();
        store.put(key(1), size(44.0));
        store.put(key(2), size(44.0));

        let generation = store.invalidate_all();

        assert_eq!(generation, 1);
        assert!(store.is_empty());
        assert_eq!(store.stats().invalidations, 2);
    }

    #[test]
    fn test_put_if_current_accepts_current_generation() {
        let store = CacheStore::new();
        let generation = store.generation();

        assert!(store.put_if_current(key(1), size(44.0), generation));
        assert_eq!(store.entry(&key(1)).map(|e| e.generation), Some(generation));
    }

    #[test]
    fn test_stale_write_never_overwrites_fresh_value() {
        let store = CacheStore::new();
        let stale_generation = store.generation();

        store.invalidate_all();
        store.put(key(1), size(100.0));

        assert!(!store.put_if_current(key(1), size(1.0), stale_generation));
        assert_eq!(store.get(&key(1)), Some(size(100.0)));
        assert_eq!(store.stats().stale_discards, 1);
    }

    #[test]
    fn test_entry_does_not_touch_stats() {
        let store = CacheStore::new();
        store.put(key(1), size(44.0));
        let _ = store.entry(&key(1));
        let _ = store.contains(&key(2));

        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(CacheStore::new());
        let mut handles = Vec::new();

        for worker in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    let k = key(worker * 1000 + i);
                    store.put(k.clone(), size(i as f64));
                    assert_eq!(store.get(&k), Some(size(i as f64)));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }
}
