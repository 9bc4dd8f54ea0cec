//! Cathays Cache - HTTP service over the cache and session storage
//!
//! Selects the cache backend from the environment and serves the JSON API.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::info;

use cathays_cache::api::{create_router, AppState};
use cathays_cache::{logging, Config, RedisRegistry};

/// Main entry point for the cache service.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables (missing required keys abort)
/// 2. Initialize tracing subscriber for logging
/// 3. Open the file cache or connect to the remote store
/// 4. Start HTTP server on configured port
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    logging::init(&config.log_level);
    info!("Starting Cathays Cache Server");
    info!(
        "Configuration loaded: backend={:?}, port={}",
        config.backend, config.server_port
    );

    let registry = RedisRegistry::new();
    let state = AppState::from_config(&config, &registry)
        .await
        .context("Failed to initialize cache backend")?;
    info!("Cache backend initialized");

    let app = create_router(state, &config.allowed_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
}
