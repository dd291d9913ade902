//! API Handlers
//!
//! HTTP request handlers for each prefetch daemon endpoint.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::Invalidation;
use crate::config::Config;
use crate::error::{PrefetchError, Result};
use crate::models::{
    CacheEntryView, CacheListResponse, HealthResponse, InvalidateQuery, InvalidateResponse,
    PrefetchBody, PrefetchOutcome, StatsResponse,
};
use crate::prefetch::Prefetcher;

/// Application state shared across all handlers.
///
/// `Prefetcher` is a cheap handle; cloning the state shares one cache.
#[derive(Clone)]
pub struct AppState {
    pub prefetcher: Prefetcher,
    /// Defaults for request fields the caller leaves out
    pub config: Config,
}

impl AppState {
    /// Creates a new AppState around an existing prefetcher.
    pub fn new(prefetcher: Prefetcher, config: Config) -> Self {
        Self { prefetcher, config }
    }

    /// Creates a new AppState from configuration with a reqwest transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        let prefetcher = Prefetcher::from_config(config)?;
        Ok(Self::new(prefetcher, config.clone()))
    }
}

/// Handler for POST /prefetch
///
/// Prefetches the described request, serving it from cache when fresh.
pub async fn prefetch_handler(
    State(state): State<AppState>,
    Json(body): Json<PrefetchBody>,
) -> Result<Json<PrefetchOutcome>> {
    if let Some(error_msg) = body.validate() {
        return Err(PrefetchError::InvalidRequest(error_msg));
    }

    let request = body.into_request(&state.config);
    let response = state.prefetcher.prefetch(request).await?;

    Ok(Json(PrefetchOutcome::from(response)))
}

/// Handler for GET /cache
///
/// Lists cached responses ordered by URL.
pub async fn cache_handler(State(state): State<AppState>) -> Json<CacheListResponse> {
    let cache = state.prefetcher.cache();

    let mut entries: Vec<CacheEntryView> = cache
        .entries()
        .iter()
        .map(|(key, entry)| CacheEntryView::new(key, entry, cache.expires_in(key)))
        .collect();
    entries.sort_by(|a, b| (&a.url, &a.method).cmp(&(&b.url, &b.method)));

    Json(CacheListResponse {
        total: entries.len(),
        entries,
    })
}

/// Handler for DELETE /cache
///
/// `?tags=a,b` removes entries carrying any of the tags; no `tags` clears
/// everything.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Query(query): Query<InvalidateQuery>,
) -> Json<InvalidateResponse> {
    let tags = query.tag_list();
    let target = match &tags {
        Some(tags) => Invalidation::tags(tags.iter().cloned()),
        None => Invalidation::All,
    };

    let removed = state.prefetcher.invalidate(target);
    Json(InvalidateResponse::new(removed, tags))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(
        state.prefetcher.stats(),
        state.prefetcher.in_flight(),
    ))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.prefetcher.has_router()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefetch::{HttpFetcher, HttpRequest, PrefetchResponse};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EchoFetcher;

    #[async_trait]
    impl HttpFetcher for EchoFetcher {
        async fn fetch(&self, request: HttpRequest) -> Result<PrefetchResponse> {
            Ok(PrefetchResponse::new(200, request.url, "page"))
        }
    }

    fn test_state() -> AppState {
        let prefetcher = Prefetcher::builder()
            .http(Arc::new(EchoFetcher))
            .build()
            .unwrap();
        AppState::new(prefetcher, Config::default())
    }

    fn body(json: &str) -> PrefetchBody {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_prefetch_and_list_handler() {
        let state = test_state();

        let result = prefetch_handler(
            State(state.clone()),
            Json(body(r#"{"url": "/posts", "cache_tags": ["posts"]}"#)),
        )
        .await
        .unwrap();
        assert!(result.prefetched);
        assert_eq!(result.response.as_ref().unwrap().url, "http://localhost/posts");

        let listing = cache_handler(State(state)).await;
        assert_eq!(listing.total, 1);
        assert_eq!(listing.entries[0].url, "/posts");
        assert_eq!(listing.entries[0].tags, vec!["posts"]);
    }

    #[tokio::test]
    async fn test_prefetch_fragment_handler() {
        let state = test_state();

        let result = prefetch_handler(State(state.clone()), Json(body(r##"{"url": "#top"}"##)))
            .await
            .unwrap();
        assert!(!result.prefetched);
        assert_eq!(state.prefetcher.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_prefetch_invalid_request() {
        let state = test_state();

        let result = prefetch_handler(State(state), Json(body(r#"{"url": ""}"#))).await;
        assert!(matches!(result, Err(PrefetchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = test_state();
        for url in ["/posts", "/users"] {
            let json = format!(r#"{{"url": "{url}", "cache_tags": ["{}"]}}"#, &url[1..]);
            prefetch_handler(State(state.clone()), Json(body(&json)))
                .await
                .unwrap();
        }

        let query = InvalidateQuery {
            tags: Some("posts".to_string()),
        };
        let response = invalidate_handler(State(state.clone()), Query(query)).await;
        assert_eq!(response.removed, 1);

        let response = invalidate_handler(State(state.clone()), Query(InvalidateQuery::default())).await;
        assert_eq!(response.removed, 1);
        assert!(response.tags.is_none());
        assert_eq!(state.prefetcher.cache().size(), 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
        assert_eq!(response.in_flight, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert!(!response.router);
    }
}
