//! Request and Response models for the prefetch daemon API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InvalidateQuery, PrefetchBody};
pub use responses::{
    CacheEntryView, CacheListResponse, HealthResponse, InvalidateResponse, PrefetchOutcome,
    StatsResponse,
};
