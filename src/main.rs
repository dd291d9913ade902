//! Modal Prefetch - diagnostics daemon
//!
//! Serves one shared prefetch cache over HTTP so it can be exercised and
//! inspected from outside the process.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modal_prefetch::api::{create_router, AppState};
use modal_prefetch::{Config, Invalidation, Prefetcher};

/// Main entry point for the prefetch daemon.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the prefetcher and its cache
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop serving and cancel pending expiry timers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modal_prefetch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Modal Prefetch daemon");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, cache_for={}ms, array_format={}, navigate={}, port={}",
        config.origin, config.cache_for_ms, config.array_format, config.navigate, config.server_port
    );

    let state = AppState::from_config(&config).context("failed to build prefetcher")?;
    let prefetcher = state.prefetcher.clone();
    info!("Prefetcher initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(prefetcher))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown, clears the cache so no expiry timer outlives the server.
async fn shutdown_signal(prefetcher: Prefetcher) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    let removed = prefetcher.invalidate(Invalidation::All);
    info!(removed, "Prefetch cache cleared, expiry timers cancelled");
}
