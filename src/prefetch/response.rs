//! Prefetched response snapshot.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A response captured by a prefetch, shared read-only once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL the response was served from
    pub url: String,
    /// Response headers, names lowercased
    pub headers: BTreeMap<String, String>,
    /// Response body as text
    pub body: String,
}

impl PrefetchResponse {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Adds a header, lowercasing its name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserializes the body as JSON (page objects are JSON payloads).
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}
