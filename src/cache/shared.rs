//! Shared Prefetch Cache
//!
//! Couples the store, the expiry scheduler and statistics behind one lock so
//! that every operation, bulk invalidation included, is atomic.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{
    CacheEntry, CacheKey, CacheStats, CacheStore, ExpiryScheduler, Invalidation, TagSet,
};
use crate::prefetch::PrefetchResponse;

#[derive(Debug, Default)]
struct CacheState {
    store: CacheStore,
    scheduler: ExpiryScheduler,
    stats: CacheStats,
}

// == Prefetch Cache ==
/// Cloneable handle to a process-scoped prefetch cache.
///
/// Construct one per application (or per test) and share clones of it.
#[derive(Debug, Clone, Default)]
pub struct PrefetchCache {
    state: Arc<Mutex<CacheState>>,
}

impl PrefetchCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a copy of the entry for `key`, regardless of freshness.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.state.lock().store.get(key).cloned()
    }

    // == Set ==
    /// Stores an entry without touching its timer.
    pub fn set(&self, key: CacheKey, entry: CacheEntry) {
        self.state.lock().store.set(key, entry);
    }

    // == Delete ==
    /// Removes the entry for `key` and cancels its timer.
    pub fn delete(&self, key: &CacheKey) -> bool {
        let mut state = self.state.lock();
        state.scheduler.cancel(key);
        state.store.delete(key).is_some()
    }

    // == Clear ==
    /// Cancels every timer and removes every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.scheduler.cancel_all();
        state.store.clear();
    }

    // == Has ==
    pub fn has(&self, key: &CacheKey) -> bool {
        self.state.lock().store.has(key)
    }

    // == Entries ==
    /// Snapshot of all `(key, entry)` pairs.
    pub fn entries(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.state
            .lock()
            .store
            .entries()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Size ==
    pub fn size(&self) -> usize {
        self.state.lock().store.size()
    }

    // == Lookup ==
    /// Returns the response for `key` if it is fresh for `cache_for`.
    ///
    /// Counts a hit or a miss.
    pub fn lookup(&self, key: &CacheKey, cache_for: Duration) -> Option<Arc<PrefetchResponse>> {
        let mut state = self.state.lock();
        let fresh = state
            .store
            .get(key)
            .filter(|entry| entry.is_fresh(cache_for))
            .map(|entry| entry.response.clone());

        match fresh {
            Some(response) => {
                state.stats.record_hit();
                Some(response)
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Like [`PrefetchCache::lookup`] without touching statistics.
    pub fn peek(&self, key: &CacheKey, cache_for: Duration) -> Option<Arc<PrefetchResponse>> {
        self.state
            .lock()
            .store
            .get(key)
            .filter(|entry| entry.is_fresh(cache_for))
            .map(|entry| entry.response.clone())
    }

    // == Insert ==
    /// Stores a fetched response and arms its expiry timer.
    ///
    /// The write always happens before the timer is armed, and arming cancels
    /// any earlier timer for the same key.
    pub fn insert(
        &self,
        key: CacheKey,
        response: Arc<PrefetchResponse>,
        tags: TagSet,
        cache_for: Duration,
    ) {
        let mut state = self.state.lock();
        state.store.set(key.clone(), CacheEntry::new(response, tags));

        let weak = Arc::downgrade(&self.state);
        let timer_key = key.clone();
        state
            .scheduler
            .arm(key, cache_for, move |id| expire(&weak, &timer_key, id));
    }

    // == Invalidate ==
    /// Removes entries per `target` and returns how many were removed.
    pub fn invalidate(&self, target: impl Into<Invalidation>) -> usize {
        let mut state = self.state.lock();

        let removed = match target.into() {
            Invalidation::All => {
                let removed = state.store.size();
                let timers = state.scheduler.cancel_all();
                state.store.clear();
                info!(removed, timers, "Prefetch cache cleared");
                removed
            }
            Invalidation::Tags(tags) => {
                let keys = state.store.keys_tagged(&tags);
                for key in &keys {
                    state.scheduler.cancel(key);
                    state.store.delete(key);
                }
                info!(removed = keys.len(), ?tags, "Prefetch cache invalidated by tag");
                keys.len()
            }
        };

        state.stats.record_invalidations(removed);
        removed
    }

    // == Pending Timers ==
    /// Number of outstanding expiry timers.
    pub fn pending_timers(&self) -> usize {
        self.state.lock().scheduler.len()
    }

    // == Expires In ==
    /// Time left until the entry for `key` is evicted, if a timer is armed.
    pub fn expires_in(&self, key: &CacheKey) -> Option<Duration> {
        self.state
            .lock()
            .scheduler
            .deadline(key)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    // == Stats ==
    /// Returns current statistics with live entry and timer counts.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.store.size();
        stats.pending_timers = state.scheduler.len();
        stats
    }

    pub(crate) fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        update(&mut self.state.lock().stats);
    }
}

/// Timer callback: evicts the entry only if `id` is still the live timer.
fn expire(state: &Weak<Mutex<CacheState>>, key: &CacheKey, id: u64) {
    let Some(state) = state.upgrade() else {
        return;
    };

    let mut state = state.lock();
    if state.scheduler.complete(key, id) {
        state.store.delete(key);
        state.stats.record_expiration();
        debug!(key = %key, "Prefetched response expired");
    }
}
