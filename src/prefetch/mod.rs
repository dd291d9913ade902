//! Prefetch Module
//!
//! Orchestrates speculative fetches: serves fresh cache entries, joins
//! fetches already in flight, dispatches through the selected transport and
//! records results in the [`PrefetchCache`].
//!
//! # Flow
//! 1. Fragment hrefs (`#section`) resolve immediately with nothing.
//! 2. GET payloads are merged into the query string.
//! 3. A fresh entry for the request identity is returned as is.
//! 4. Otherwise the request goes to the router (`navigate`) or out over HTTP,
//!    and a successful HTTP response is cached and scheduled for expiry.

mod headers;
mod query;
mod request;
mod response;
mod transport;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{CacheKey, CacheStats, Invalidation, PrefetchCache, TagSet, DEFAULT_CACHE_FOR};
use crate::config::Config;
use crate::error::{PrefetchError, Result};

pub use headers::{protocol_headers, ModalIdGenerator, MODAL_ID_PREFIX};
pub use query::{encode_query, merge_data_into_query_string, ArrayFormat};
pub use request::{equivalent, OnPrefetched, OnPrefetching, PrefetchMode, PrefetchRequest};
pub use response::PrefetchResponse;
pub use transport::{HttpFetcher, HttpRequest, NavigationRouter, ReqwestFetcher, RouterVisit};

/// Purpose value tagged onto direct prefetch requests.
pub const PREFETCH_PURPOSE: &str = "prefetch";

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<PrefetchResponse>>>>;
type InFlight = Arc<Mutex<HashMap<CacheKey, SharedFetch>>>;

/// Either a response that became fresh meanwhile, or a fetch to await.
enum Dispatch {
    Ready(Arc<PrefetchResponse>),
    Pending(SharedFetch),
}

// == Prefetcher ==
/// Cloneable prefetch orchestrator.
///
/// Transport capability is fixed at construction: navigation-aware prefetches
/// need a [`NavigationRouter`] configured through the builder.
#[derive(Clone)]
pub struct Prefetcher {
    inner: Arc<PrefetcherInner>,
}

struct PrefetcherInner {
    cache: PrefetchCache,
    http: Arc<dyn HttpFetcher>,
    router: Option<Arc<dyn NavigationRouter>>,
    origin: Url,
    base_url: Option<String>,
    version: Option<String>,
    default_cache_for: Duration,
    ids: ModalIdGenerator,
    in_flight: InFlight,
}

impl Prefetcher {
    pub fn builder() -> PrefetcherBuilder {
        PrefetcherBuilder::default()
    }

    /// Builds a prefetcher with a reqwest transport from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder()
            .origin(&config.origin)
            .base_url(config.base_url.clone())
            .version(config.version.clone())
            .default_cache_for(config.cache_for())
            .request_timeout(config.request_timeout())
            .build()
    }

    /// The cache this prefetcher writes to.
    pub fn cache(&self) -> &PrefetchCache {
        &self.inner.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Default cache window for requests without an explicit one.
    pub fn default_cache_for(&self) -> Duration {
        self.inner.default_cache_for
    }

    /// Removes cached responses; see [`PrefetchCache::invalidate`].
    pub fn invalidate(&self, target: impl Into<Invalidation>) -> usize {
        self.inner.cache.invalidate(target)
    }

    // == Prefetch ==
    /// Prefetches `request`, serving it from cache when fresh.
    ///
    /// Resolves to `None` for fragment hrefs and when the router yields no
    /// response. Failures are logged and returned; nothing is cached for them.
    pub async fn prefetch(&self, request: PrefetchRequest) -> Result<Option<Arc<PrefetchResponse>>> {
        if request.is_fragment() {
            debug!(href = %request.href, "Fragment target, nothing to prefetch");
            return Ok(None);
        }

        let (url, data) = request.resolve();
        let key = CacheKey::new(&request.method, &url, &data, &request.headers);
        let cache_for = request.effective_cache_for(self.inner.default_cache_for);

        if let Some(response) = self.inner.cache.lookup(&key, cache_for) {
            debug!(key = %key, "Serving prefetch from cache");
            request.notify_prefetched(&response);
            return Ok(Some(response));
        }

        if request.navigate {
            return self.prefetch_with_router(&request, url, data, cache_for).await;
        }

        request.notify_prefetching();

        let fetch = match self.dispatch(key, &request, url, data, cache_for)? {
            Dispatch::Ready(response) => {
                request.notify_prefetched(&response);
                return Ok(Some(response));
            }
            Dispatch::Pending(fetch) => fetch,
        };

        let response = fetch.await?;
        request.notify_prefetched(&response);
        Ok(Some(response))
    }

    // == Cached ==
    /// Fresh prefetched response for a navigation to `request`, if any.
    ///
    /// Matching ignores the `Purpose` header, callbacks and cache policy, so
    /// a plain visit finds the response its prefetch stored.
    pub fn cached(&self, request: &PrefetchRequest) -> Option<Arc<PrefetchResponse>> {
        if request.is_fragment() {
            return None;
        }

        let cache_for = request.effective_cache_for(self.inner.default_cache_for);
        self.inner.cache.lookup(&request.cache_key(), cache_for)
    }

    /// True when navigation-aware prefetching is available.
    pub fn has_router(&self) -> bool {
        self.inner.router.is_some()
    }

    /// Number of direct fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.lock().len()
    }

    async fn prefetch_with_router(
        &self,
        request: &PrefetchRequest,
        url: String,
        data: Value,
        cache_for: Duration,
    ) -> Result<Option<Arc<PrefetchResponse>>> {
        let Some(router) = &self.inner.router else {
            warn!(href = %request.href, "Navigation-aware prefetch requested without router support");
            return Err(PrefetchError::UnsupportedTransport(
                "navigation-aware prefetch needs a router with prefetch support; \
                 set navigate to false to prefetch over HTTP"
                    .to_string(),
            ));
        };

        let visit = RouterVisit {
            url,
            method: request.method.clone(),
            data,
            headers: request.headers.clone(),
            cache_for,
            cache_tags: request.cache_tags.clone(),
            on_prefetching: request.on_prefetching.clone(),
            on_prefetched: request.on_prefetched.clone(),
        };

        let response = router.prefetch(visit).await.inspect_err(|err| {
            warn!(href = %request.href, error = %err, "Router prefetch failed");
        })?;

        Ok(response.map(Arc::new))
    }

    /// Joins the fetch in flight for `key` or starts a new one.
    fn dispatch(
        &self,
        key: CacheKey,
        request: &PrefetchRequest,
        url: String,
        data: Value,
        cache_for: Duration,
    ) -> Result<Dispatch> {
        // Built before locking: the id generator is caller code
        let http_request = self.http_request(request, &url, data)?;
        let mut in_flight = self.inner.in_flight.lock();

        if let Some(response) = self.inner.cache.peek(&key, cache_for) {
            return Ok(Dispatch::Ready(response));
        }

        if let Some(fetch) = in_flight.get(&key) {
            debug!(key = %key, "Joining prefetch already in flight");
            self.inner.cache.record(CacheStats::record_join);
            return Ok(Dispatch::Pending(fetch.clone()));
        }

        let runtime = Handle::try_current()
            .map_err(|_| PrefetchError::Internal("prefetch requires a Tokio runtime".to_string()))?;

        let task = runtime.spawn(run_fetch(
            self.inner.http.clone(),
            self.inner.cache.clone(),
            self.inner.in_flight.clone(),
            key.clone(),
            http_request,
            request.cache_tags.clone(),
            cache_for,
        ));

        let fetch = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => Err(PrefetchError::Internal(format!("prefetch task failed: {err}"))),
            }
        }
        .boxed()
        .shared();

        in_flight.insert(key, fetch.clone());
        Ok(Dispatch::Pending(fetch))
    }

    fn http_request(&self, request: &PrefetchRequest, url: &str, data: Value) -> Result<HttpRequest> {
        let absolute = self
            .inner
            .origin
            .join(url)
            .map_err(|e| PrefetchError::InvalidRequest(format!("Invalid URL {url}: {e}")))?;

        let version = request.version.as_deref().or(self.inner.version.as_deref());
        let base_url = request.base_url.as_deref().or(self.inner.base_url.as_deref());

        let protocol = protocol_headers(
            version,
            base_url,
            &self.inner.ids.generate(),
            false,
            Some(PREFETCH_PURPOSE),
        );

        // Protocol headers replace caller headers of any spelling
        let mut headers: BTreeMap<String, String> = request
            .headers
            .iter()
            .filter(|(name, _)| !protocol.keys().any(|p| p.eq_ignore_ascii_case(name)))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        headers.extend(protocol);

        Ok(HttpRequest {
            method: request.method.clone(),
            url: absolute.to_string(),
            data,
            headers,
        })
    }
}

/// Body of the spawned fetch task. Runs to completion even if every caller
/// stops waiting, so a dispatched prefetch always lands in the cache.
async fn run_fetch(
    http: Arc<dyn HttpFetcher>,
    cache: PrefetchCache,
    in_flight: InFlight,
    key: CacheKey,
    request: HttpRequest,
    tags: TagSet,
    cache_for: Duration,
) -> Result<Arc<PrefetchResponse>> {
    let _slot = InFlightSlot {
        in_flight,
        key: key.clone(),
    };
    cache.record(CacheStats::record_fetch);
    let url = request.url.clone();

    match http.fetch(request).await {
        Ok(response) => {
            let response = Arc::new(response);
            cache.insert(key.clone(), response.clone(), tags, cache_for);
            debug!(key = %key, status = response.status, "Prefetched response cached");
            Ok(response)
        }
        Err(err) => {
            cache.record(CacheStats::record_failure);
            warn!(url = %url, error = %err, "Prefetch failed");
            Err(err)
        }
    }
}

/// Releases the in-flight entry for a key when the fetch task ends,
/// including when the fetcher panics.
struct InFlightSlot {
    in_flight: InFlight,
    key: CacheKey,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.key);
    }
}

// == Prefetcher Builder ==
/// Builder for [`Prefetcher`].
#[derive(Default)]
pub struct PrefetcherBuilder {
    cache: Option<PrefetchCache>,
    http: Option<Arc<dyn HttpFetcher>>,
    router: Option<Arc<dyn NavigationRouter>>,
    origin: Option<String>,
    base_url: Option<String>,
    version: Option<String>,
    default_cache_for: Option<Duration>,
    request_timeout: Option<Duration>,
    ids: ModalIdGenerator,
}

impl PrefetcherBuilder {
    /// Shares an existing cache instead of creating a fresh one.
    pub fn cache(mut self, cache: PrefetchCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the reqwest transport.
    pub fn http(mut self, http: Arc<dyn HttpFetcher>) -> Self {
        self.http = Some(http);
        self
    }

    /// Enables navigation-aware prefetching.
    pub fn router(mut self, router: Arc<dyn NavigationRouter>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn default_cache_for(mut self, cache_for: Duration) -> Self {
        self.default_cache_for = Some(cache_for);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Installs a custom modal id generator.
    pub fn generate_id_using<F>(mut self, generate: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.ids = ModalIdGenerator::using(generate);
        self
    }

    pub fn build(self) -> Result<Prefetcher> {
        let origin = self.origin.as_deref().unwrap_or("http://localhost");
        let origin = Url::parse(origin)
            .map_err(|e| PrefetchError::InvalidRequest(format!("Invalid origin {origin}: {e}")))?;

        let http: Arc<dyn HttpFetcher> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestFetcher::new(
                self.request_timeout.unwrap_or(Duration::from_secs(30)),
            )?),
        };

        Ok(Prefetcher {
            inner: Arc::new(PrefetcherInner {
                cache: self.cache.unwrap_or_default(),
                http,
                router: self.router,
                origin,
                base_url: self.base_url,
                version: self.version,
                default_cache_for: self.default_cache_for.unwrap_or(DEFAULT_CACHE_FOR),
                ids: self.ids,
                in_flight: InFlight::default(),
            }),
        })
    }
}
