//! Cache Module
//!
//! Prefetch cache keyed by request identity, with per-entry expiry timers
//! and tag invalidation.

mod entry;
mod invalidation;
mod key;
mod scheduler;
mod shared;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{normalize_tags, CacheEntry, TagSet};
pub use invalidation::Invalidation;
pub use key::{canonical_json, CacheKey, PURPOSE_HEADER};
pub use scheduler::{ExpiryScheduler, TimerId};
pub use shared::PrefetchCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Cache window applied when the caller does not specify one (30 seconds)
pub const DEFAULT_CACHE_FOR: std::time::Duration = std::time::Duration::from_millis(30_000);
