//! catalog-web - read-only book catalog browser
//!
//! Serves the catalog written by catalog-import as HTML pages and JSON.

use anyhow::{Context, Result};
use catalog_common::config::{resolve_database_path, CatalogConfig, TomlConfig};
use catalog_common::CatalogStore;
use catalog_web::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Command-line arguments for catalog-web
#[derive(Parser, Debug)]
#[command(name = "catalog-web")]
#[command(about = "Browse the book catalog")]
#[command(version)]
struct Args {
    /// Config file (defaults to $CATALOG_CONFIG or <config dir>/catalog/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "CATALOG_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = match &args.config {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => TomlConfig::load_or_default(),
    };
    let mut config = CatalogConfig::resolve(&toml);
    config.database_path = resolve_database_path(args.database.as_deref(), &toml);
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .init();

    info!("Starting catalog-web v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let store = CatalogStore::open(
        &config.database_path,
        Duration::from_millis(config.connect_timeout_ms),
    )
    .await
    .context("Failed to open catalog store")?;

    let app = build_router(AppState::from_config(store.clone(), &config));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("catalog-web listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("catalog-web stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
