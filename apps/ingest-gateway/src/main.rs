//! Claims Ingest Gateway
//!
//! HTTP entry point: loads configuration, installs tracing and serves the
//! upload API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ingest_gateway::config::Config;
use ingest_gateway::routes;
use ingest_gateway::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ingest_gateway=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Invalid configuration")?;

    tracing::info!("Starting Ingest Gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Directory: {} (base DN {})", config.directory.url(), config.directory.base_dn);
    tracing::info!("Backend: {}:{}", config.backend.host, config.backend.port);
    tracing::info!(
        "Shared storage: {} (collision policy {:?})",
        config.storage.root.display(),
        config.storage.collision_policy
    );
    if !config.server.require_secure_transport {
        tracing::warn!("REQUIRE_SECURE_TRANSPORT is off; credentials are accepted from plaintext requests");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid SERVER_HOST/SERVER_PORT")?;

    let app_state = AppState::new(config);

    // Create the storage root up front so permission problems show at startup
    match app_state.gateway().storage().ensure_root().await {
        Ok(root) => tracing::info!("Storage root ready at {}", root.display()),
        Err(e) => tracing::warn!("Storage root not ready: {}. Will retry on first upload", e),
    }

    let app = routes::app(app_state);

    tracing::info!("Ingest Gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
