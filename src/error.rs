//! Error types for the prefetch layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Prefetch Error Enum ==
/// Unified error type for prefetching.
///
/// Cloneable so every caller joined on the same in-flight fetch receives
/// the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrefetchError {
    /// Navigation-aware prefetch requested but no router capability is configured
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// Network-level failure talking to the upstream
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Request parameters could not be turned into a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal failure (e.g. the fetch task was aborted)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for PrefetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => PrefetchError::Status {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => PrefetchError::Transport(err.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for PrefetchError {
    fn into_response(self) -> Response {
        let status = match &self {
            PrefetchError::UnsupportedTransport(_) => StatusCode::NOT_IMPLEMENTED,
            PrefetchError::Transport(_) => StatusCode::BAD_GATEWAY,
            PrefetchError::Status { .. } => StatusCode::BAD_GATEWAY,
            PrefetchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PrefetchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the prefetch layer.
pub type Result<T> = std::result::Result<T, PrefetchError>;
