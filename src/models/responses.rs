//! Response DTOs for the prefetch daemon API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheEntry, CacheKey, CacheStats};
use crate::prefetch::PrefetchResponse;

/// Response body for POST /prefetch
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchOutcome {
    /// False for fragment hrefs and empty router results
    pub prefetched: bool,
    pub response: Option<PrefetchResponse>,
}

impl From<Option<Arc<PrefetchResponse>>> for PrefetchOutcome {
    fn from(response: Option<Arc<PrefetchResponse>>) -> Self {
        Self {
            prefetched: response.is_some(),
            response: response.map(|r| PrefetchResponse::clone(&r)),
        }
    }
}

/// One cached response as listed by GET /cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryView {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub status: u16,
    /// Age in milliseconds
    pub age_ms: u64,
    /// Milliseconds until eviction; absent for entries that never expire
    pub expires_in_ms: Option<u64>,
    /// Wall-clock fetch time in RFC 3339
    pub fetched_at: String,
}

impl CacheEntryView {
    pub fn new(key: &CacheKey, entry: &CacheEntry, expires_in: Option<Duration>) -> Self {
        Self {
            method: key.method().to_string(),
            url: key.url().to_string(),
            headers: key.headers().clone(),
            tags: entry.tags.iter().cloned().collect(),
            status: entry.response.status,
            age_ms: millis(entry.age()),
            expires_in_ms: expires_in.map(millis),
            fetched_at: entry.fetched_at.to_rfc3339(),
        }
    }
}

/// Response body for GET /cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheListResponse {
    pub total: usize,
    pub entries: Vec<CacheEntryView>,
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Success message
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
    /// Tags that were invalidated; absent for a full reset
    pub tags: Option<Vec<String>>,
}

impl InvalidateResponse {
    pub fn new(removed: usize, tags: Option<Vec<String>>) -> Self {
        let message = match &tags {
            Some(tags) => format!("Invalidated {removed} entries tagged {}", tags.join(", ")),
            None => format!("Cleared {removed} entries"),
        };
        Self {
            message,
            removed,
            tags,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Direct fetches currently in flight
    pub in_flight: usize,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, in_flight: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Whether navigation-aware prefetching is available
    pub router: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(router: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            router,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::normalize_tags;
    use serde_json::{json, Value};

    #[test]
    fn test_prefetch_outcome_serialize() {
        let response = Arc::new(PrefetchResponse::new(200, "http://localhost/posts", "ok"));
        let json = serde_json::to_value(PrefetchOutcome::from(Some(response))).unwrap();
        assert_eq!(json["prefetched"], true);
        assert_eq!(json["response"]["status"], 200);

        let skipped = serde_json::to_value(PrefetchOutcome::from(None)).unwrap();
        assert_eq!(skipped["prefetched"], false);
        assert_eq!(skipped["response"], Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_entry_view() {
        let key = CacheKey::new("GET", "/posts", &json!({}), &BTreeMap::new());
        let entry = CacheEntry::new(
            Arc::new(PrefetchResponse::new(200, "http://localhost/posts", "ok")),
            normalize_tags(["posts", "feed"]),
        );
        tokio::time::advance(Duration::from_millis(1500)).await;

        let view = CacheEntryView::new(&key, &entry, Some(Duration::from_millis(3500)));
        assert_eq!(view.method, "get");
        assert_eq!(view.url, "/posts");
        assert_eq!(view.tags, vec!["feed", "posts"]);
        assert_eq!(view.age_ms, 1500);
        assert_eq!(view.expires_in_ms, Some(3500));
    }

    #[test]
    fn test_invalidate_response_message() {
        let tagged = InvalidateResponse::new(2, Some(vec!["posts".to_string()]));
        assert!(tagged.message.contains("posts"));

        let cleared = InvalidateResponse::new(5, None);
        assert_eq!(cleared.message, "Cleared 5 entries");
    }

    #[test]
    fn test_stats_response_flattens() {
        let mut stats = CacheStats::default();
        stats.record_hit();
        stats.record_miss();

        let json = serde_json::to_value(StatsResponse::new(stats, 1)).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["misses"], 1);
        assert_eq!(json["hit_rate"], 0.5);
        assert_eq!(json["in_flight"], 1);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(false);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
