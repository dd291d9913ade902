//! Prefetch request parameters.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::{normalize_tags, CacheKey, TagSet};
use crate::error::PrefetchError;
use crate::prefetch::query::{merge_data_into_query_string, ArrayFormat};
use crate::prefetch::PrefetchResponse;

/// Called right before a network prefetch is dispatched.
pub type OnPrefetching = Arc<dyn Fn() + Send + Sync>;

/// Called with the response once a prefetch resolves, from cache or network.
pub type OnPrefetched = Arc<dyn Fn(&PrefetchResponse) + Send + Sync>;

/// Interaction that triggers a link's prefetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefetchMode {
    Hover,
    Click,
    Mount,
}

impl FromStr for PrefetchMode {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hover" => Ok(PrefetchMode::Hover),
            "click" => Ok(PrefetchMode::Click),
            "mount" => Ok(PrefetchMode::Mount),
            other => Err(PrefetchError::InvalidRequest(format!(
                "Unknown prefetch mode: {other}"
            ))),
        }
    }
}

/// Parameters of one prefetch call.
///
/// Only method, URL, payload and headers form the request identity; the
/// remaining fields are cache policy, transport choice and callbacks.
#[derive(Clone)]
pub struct PrefetchRequest {
    pub href: String,
    pub method: String,
    pub data: Value,
    pub headers: BTreeMap<String, String>,
    pub array_format: ArrayFormat,
    /// Use the navigation-aware router instead of a direct HTTP request
    pub navigate: bool,
    /// Cache window; `None` falls back to the configured default
    pub cache_for: Option<Duration>,
    pub cache_tags: TagSet,
    pub modes: Vec<PrefetchMode>,
    pub base_url: Option<String>,
    pub version: Option<String>,
    pub on_prefetching: Option<OnPrefetching>,
    pub on_prefetched: Option<OnPrefetched>,
}

impl PrefetchRequest {
    /// A GET prefetch of `href` with every other parameter defaulted.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            method: "get".to_string(),
            data: Value::Object(Map::new()),
            headers: BTreeMap::new(),
            array_format: ArrayFormat::default(),
            navigate: false,
            cache_for: None,
            cache_tags: TagSet::new(),
            modes: Vec::new(),
            base_url: None,
            version: None,
            on_prefetching: None,
            on_prefetched: None,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_lowercase();
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn array_format(mut self, format: ArrayFormat) -> Self {
        self.array_format = format;
        self
    }

    pub fn navigate(mut self, navigate: bool) -> Self {
        self.navigate = navigate;
        self
    }

    pub fn cache_for(mut self, cache_for: Duration) -> Self {
        self.cache_for = Some(cache_for);
        self
    }

    pub fn cache_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache_tags = normalize_tags(tags);
        self
    }

    pub fn modes(mut self, modes: impl IntoIterator<Item = PrefetchMode>) -> Self {
        self.modes = modes.into_iter().collect();
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn on_prefetching<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_prefetching = Some(Arc::new(callback));
        self
    }

    pub fn on_prefetched<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PrefetchResponse) + Send + Sync + 'static,
    {
        self.on_prefetched = Some(Arc::new(callback));
        self
    }

    /// In-page anchors never hit the network.
    pub fn is_fragment(&self) -> bool {
        self.href.starts_with('#')
    }

    /// URL and body payload after merging GET data into the query string.
    pub fn resolve(&self) -> (String, Value) {
        merge_data_into_query_string(&self.method, &self.href, self.data.clone(), self.array_format)
    }

    /// Request identity of this prefetch.
    pub fn cache_key(&self) -> CacheKey {
        let (url, data) = self.resolve();
        CacheKey::new(&self.method, &url, &data, &self.headers)
    }

    /// Effective cache window.
    ///
    /// An explicit `cache_for` always wins. Otherwise a click-only link keeps
    /// nothing (its visit follows immediately) and everything else gets
    /// `default`.
    pub fn effective_cache_for(&self, default: Duration) -> Duration {
        match self.cache_for {
            Some(cache_for) => cache_for,
            None if self.modes == [PrefetchMode::Click] => Duration::ZERO,
            None => default,
        }
    }

    pub(crate) fn notify_prefetching(&self) {
        if let Some(callback) = &self.on_prefetching {
            callback();
        }
    }

    pub(crate) fn notify_prefetched(&self, response: &PrefetchResponse) {
        if let Some(callback) = &self.on_prefetched {
            callback(response);
        }
    }
}

impl fmt::Debug for PrefetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchRequest")
            .field("href", &self.href)
            .field("method", &self.method)
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("navigate", &self.navigate)
            .field("cache_for", &self.cache_for)
            .field("cache_tags", &self.cache_tags)
            .finish_non_exhaustive()
    }
}

/// True when both requests target the same logical resource.
///
/// Callbacks, cache policy and the `Purpose` header are ignored.
pub fn equivalent(a: &PrefetchRequest, b: &PrefetchRequest) -> bool {
    a.cache_key() == b.cache_key()
}
