//! Emissor data service (emissor-data) - Main entry point
//!
//! Persists the scenario, signal and annotation events of the event bus as
//! emissor scenario folders and serves scenario id lookups over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use emissor_common::config::{load_config, resolve_config_path};
use emissor_common::events::EventBus;
use emissor_data::{build_router, AppState, EmissorDataService, EmissorDataStore};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for emissor-data
#[derive(Parser, Debug)]
#[command(name = "emissor-data")]
#[command(about = "Emissor persistence service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "EMISSOR_DATA_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "EMISSOR_DATA_PORT")]
    port: Option<u16>,

    /// Root folder of the stored scenarios
    #[arg(long, env = "EMISSOR_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration is read before tracing is up; it selects the log level
    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = load_config(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(path) = args.storage_path {
        config.storage.path = path;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize tracing
    let default_filter = format!("emissor_data={},tower_http={}", config.logging.level, config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting emissor data service v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Configuration file: {}", path.display()),
        None => info!("No configuration file, using defaults"),
    }
    info!("Storage path: {}", config.storage.path.display());

    let store = EmissorDataStore::from_config(&config.storage, &config.media)
        .context("Failed to initialize scenario storage")?;
    let store = Arc::new(RwLock::new(store));
    let event_bus = EventBus::new(config.event.bus_capacity);

    let mut service = EmissorDataService::new(store.clone(), event_bus.clone(), config.event.topics.clone()).await;
    service.start();

    let app = build_router(AppState::new(store, event_bus));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    service.stop().await;
    info!("Server shutdown complete");
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
