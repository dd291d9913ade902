//! Request DTOs for the prefetch daemon API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::prefetch::{ArrayFormat, PrefetchMode, PrefetchRequest};

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Request body for POST /prefetch
///
/// Unset optional fields fall back to the daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchBody {
    /// Target href, relative to the configured origin or absolute
    pub url: String,
    /// HTTP verb (default: get)
    #[serde(default)]
    pub method: Option<String>,
    /// Request payload; merged into the query string for GET
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Cache window in milliseconds
    #[serde(default)]
    pub cache_for_ms: Option<u64>,
    #[serde(default)]
    pub cache_tags: Vec<String>,
    #[serde(default)]
    pub navigate: Option<bool>,
    #[serde(default)]
    pub query_array_format: Option<ArrayFormat>,
    #[serde(default)]
    pub modes: Vec<PrefetchMode>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PrefetchBody {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.url.trim().is_empty() {
            return Some("URL cannot be empty".to_string());
        }
        if let Some(method) = &self.method {
            if !METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                return Some(format!("Unsupported method: {method}"));
            }
        }
        if !self.data.is_null() && !self.data.is_object() {
            return Some("Data must be a JSON object".to_string());
        }
        None
    }

    /// Builds the prefetch request, filling gaps from `config`.
    pub fn into_request(self, config: &Config) -> PrefetchRequest {
        let mut request = PrefetchRequest::new(self.url)
            .method(self.method.as_deref().unwrap_or("get"))
            .data(self.data)
            .headers(self.headers)
            .cache_tags(self.cache_tags)
            .modes(self.modes)
            .array_format(self.query_array_format.unwrap_or(config.array_format))
            .navigate(self.navigate.unwrap_or(config.navigate));

        if let Some(ms) = self.cache_for_ms {
            request = request.cache_for(Duration::from_millis(ms));
        }
        if let Some(base_url) = self.base_url {
            request = request.base_url(base_url);
        }
        if let Some(version) = self.version {
            request = request.version(version);
        }

        request
    }
}

/// Query string for DELETE /cache
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Comma-separated tags; absent means a full reset
    pub tags: Option<String>,
}

impl InvalidateQuery {
    /// Parsed tag list, or `None` for a full reset.
    pub fn tag_list(&self) -> Option<Vec<String>> {
        self.tags.as_ref().map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        })
    }
}
