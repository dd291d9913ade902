//! Configuration Module
//!
//! Handles loading prefetch and daemon configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::prefetch::ArrayFormat;

/// Prefetch configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP port of the diagnostics server
    pub server_port: u16,
    /// Default cache window in milliseconds
    pub cache_for_ms: u64,
    /// Origin that relative hrefs are resolved against
    pub origin: String,
    /// Fallback for the modal base URL header
    pub base_url: Option<String>,
    /// Fallback for the asset version header
    pub version: Option<String>,
    /// Default query-string array encoding
    pub array_format: ArrayFormat,
    /// Default transport choice for requests that don't specify one
    pub navigate: bool,
    /// Upstream request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Diagnostics server port (default: 3000)
    /// - `PREFETCH_CACHE_FOR_MS` - Default cache window (default: 30000)
    /// - `PREFETCH_ORIGIN` - Origin for relative hrefs (default: http://localhost)
    /// - `PREFETCH_BASE_URL` - Modal base URL header fallback (default: unset)
    /// - `PREFETCH_VERSION` - Asset version header fallback (default: unset)
    /// - `PREFETCH_ARRAY_FORMAT` - `brackets` or `indices` (default: brackets)
    /// - `PREFETCH_NAVIGATE` - Default navigate flag (default: false)
    /// - `REQUEST_TIMEOUT_MS` - Upstream timeout (default: 30000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_for_ms: parse_var("PREFETCH_CACHE_FOR_MS").unwrap_or(defaults.cache_for_ms),
            origin: env::var("PREFETCH_ORIGIN").unwrap_or(defaults.origin),
            base_url: env::var("PREFETCH_BASE_URL").ok().filter(|v| !v.is_empty()),
            version: env::var("PREFETCH_VERSION").ok().filter(|v| !v.is_empty()),
            array_format: parse_var("PREFETCH_ARRAY_FORMAT").unwrap_or(defaults.array_format),
            navigate: parse_var("PREFETCH_NAVIGATE").unwrap_or(defaults.navigate),
            request_timeout_ms: parse_var("REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout_ms),
        }
    }

    /// Default cache window as a duration.
    pub fn cache_for(&self) -> Duration {
        Duration::from_millis(self.cache_for_ms)
    }

    /// Upstream timeout as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_for_ms: 30_000,
            origin: "http://localhost".to_string(),
            base_url: None,
            version: None,
            array_format: ArrayFormat::Brackets,
            navigate: false,
            request_timeout_ms: 30_000,
        }
    }
}
