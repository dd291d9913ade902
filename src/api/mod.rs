//! API Module
//!
//! HTTP handlers and routing for the prefetch diagnostics daemon.
//!
//! # Endpoints
//! - `POST /prefetch` - Prefetch a request through the shared cache
//! - `GET /cache` - List cached responses
//! - `DELETE /cache` - Invalidate by tag or clear the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
