//! Prefetch transports.
//!
//! Two paths exist: a direct HTTP request ([`HttpFetcher`], backed by
//! reqwest) and delegation to a navigation-aware router
//! ([`NavigationRouter`]) that owns history and its own prefetch cache.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::cache::TagSet;
use crate::error::{PrefetchError, Result};
use crate::prefetch::request::{OnPrefetched, OnPrefetching};
use crate::prefetch::PrefetchResponse;

/// A fully resolved direct HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    /// Absolute URL
    pub url: String,
    /// JSON body; ignored for GET and HEAD
    pub data: Value,
    pub headers: BTreeMap<String, String>,
}

/// Performs direct HTTP prefetches.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Sends the request. Non-success statuses are errors.
    async fn fetch(&self, request: HttpRequest) -> Result<PrefetchResponse>;
}

// == Reqwest Fetcher ==
/// [`HttpFetcher`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Builds a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrefetchError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: HttpRequest) -> Result<PrefetchResponse> {
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| PrefetchError::InvalidRequest(format!("Invalid method: {}", request.method)))?;

        let mut builder = self.client.request(method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let has_body = !matches!(&request.data, Value::Null)
            && !matches!(&request.data, Value::Object(map) if map.is_empty());
        if has_body && method != Method::GET && method != Method::HEAD {
            builder = builder.json(&request.data);
        }

        debug!(method = %method, url = %request.url, "Dispatching prefetch request");
        let response = builder.send().await?;

        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            return Err(PrefetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(PrefetchResponse {
            status: status.as_u16(),
            url,
            headers,
            body,
        })
    }
}

// == Navigation Router ==
/// What a navigation-aware prefetch hands to the router.
#[derive(Clone)]
pub struct RouterVisit {
    pub url: String,
    pub method: String,
    pub data: Value,
    pub headers: BTreeMap<String, String>,
    pub cache_for: Duration,
    pub cache_tags: TagSet,
    pub on_prefetching: Option<OnPrefetching>,
    pub on_prefetched: Option<OnPrefetched>,
}

impl std::fmt::Debug for RouterVisit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterVisit")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("cache_for", &self.cache_for)
            .field("cache_tags", &self.cache_tags)
            .finish_non_exhaustive()
    }
}

/// Client-side router capable of prefetching through its own history-aware
/// pipeline. The router invokes the visit's lifecycle callbacks itself.
#[async_trait]
pub trait NavigationRouter: Send + Sync {
    async fn prefetch(&self, visit: RouterVisit) -> Result<Option<PrefetchResponse>>;
}
