//! Cache Entry Module
//!
//! Defines the structure for individual prefetched responses.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::prefetch::PrefetchResponse;

/// Normalized set of cache tags.
pub type TagSet = BTreeSet<String>;

/// Normalizes caller tags into a set, dropping empty labels.
pub fn normalize_tags<I, S>(tags: I) -> TagSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter()
        .map(Into::into)
        .filter(|tag: &String| !tag.is_empty())
        .collect()
}

// == Cache Entry ==
/// A prefetched response snapshot with metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response, never mutated after insertion
    pub response: Arc<PrefetchResponse>,
    /// Creation instant on the runtime clock
    pub created_at: Instant,
    /// Wall-clock creation time, for diagnostics
    pub fetched_at: DateTime<Utc>,
    /// Tags captured at insertion
    pub tags: TagSet,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(response: Arc<PrefetchResponse>, tags: TagSet) -> Self {
        Self {
            response,
            created_at: Instant::now(),
            fetched_at: Utc::now(),
            tags,
        }
    }

    // == Age ==
    /// Time elapsed since the entry was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be served for `cache_for`.
    ///
    /// Fresh while `age < cache_for`; a zero `cache_for` is never fresh.
    pub fn is_fresh(&self, cache_for: Duration) -> bool {
        self.age() < cache_for
    }

    // == Tag Intersection ==
    /// Returns true if any of `tags` is attached to this entry.
    pub fn has_any_tag(&self, tags: &TagSet) -> bool {
        !self.tags.is_disjoint(tags)
    }
}
