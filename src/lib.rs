//! Modal Prefetch - speculative request cache for modal navigation
//!
//! Prefetches pages ahead of an anticipated visit, caches responses by
//! normalized request identity with per-entry expiry and tag invalidation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod prefetch;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheKey, CacheStats, Invalidation, PrefetchCache};
pub use config::Config;
pub use error::{PrefetchError, Result};
pub use prefetch::{PrefetchRequest, PrefetchResponse, Prefetcher};
