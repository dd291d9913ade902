//! Cache Statistics Module
//!
//! Tracks prefetch cache behavior: hits, misses, fetches and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks prefetch cache metrics.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Prefetches served from a fresh cache entry
    pub hits: u64,
    /// Prefetches that found no fresh entry
    pub misses: u64,
    /// Network requests actually dispatched
    pub network_fetches: u64,
    /// Prefetches that joined a fetch already in flight
    pub in_flight_joins: u64,
    /// Failed network fetches
    pub failures: u64,
    /// Entries evicted by their expiry timer
    pub expirations: u64,
    /// Entries removed by invalidation
    pub invalidations: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current number of outstanding expiry timers
    pub pending_timers: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch(&mut self) {
        self.network_fetches += 1;
    }

    pub fn record_join(&mut self) {
        self.in_flight_joins += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    // == Record Invalidations ==
    /// Adds `count` invalidated entries.
    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.network_fetches, 0);
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.pending_timers, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_invalidations() {
        let mut stats = CacheStats::new();
        stats.record_invalidations(2);
        stats.record_invalidations(0);
        stats.record_invalidations(3);
        assert_eq!(stats.invalidations, 5);
    }

    #[test]
    fn test_counters() {
        let mut stats = CacheStats::new();
        stats.record_fetch();
        stats.record_join();
        stats.record_join();
        stats.record_failure();
        stats.record_expiration();

        assert_eq!(stats.network_fetches, 1);
        assert_eq!(stats.in_flight_joins, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.expirations, 1);
    }
}
