//! floodmap-api - fused flood report service
//!
//! Resolves configuration, opens the report database, and serves the
//! nearby-report and fusion endpoints.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use floodmap_api::alerts::{AlertSource, DisabledAlertSource, NwsAlertClient};
use floodmap_api::{build_router, AppState};
use floodmap_common::config::{load_toml_config, LoggingConfig, RootFolderInitializer, RootFolderResolver};
use floodmap_common::db::init_database;
use floodmap_common::FusionEngine;

/// Command-line arguments for floodmap-api
#[derive(Parser, Debug)]
#[command(name = "floodmap-api")]
#[command(about = "Fused flood report service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "FLOODMAP_PORT")]
    port: Option<u16>,

    /// Root folder holding floodmap.db
    #[arg(short, long, env = "FLOODMAP_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "FLOODMAP_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "floodmap_api={level},floodmap_common={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loads before tracing exists; its own log lines are not recorded
    let config = load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!(
        "Starting Floodmap API (floodmap-api) v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Fail fast on a bad service region
    let region = config
        .service_region()
        .context("Invalid service region configuration")?;
    info!(
        "Service region '{}' with {} vertices",
        region.name(),
        region.vertices().len()
    );
    let engine = FusionEngine::new(region);

    let resolver = RootFolderResolver::new(args.root_folder, config.root_folder.clone());
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let alerts: Arc<dyn AlertSource> = if config.alert_feed.enabled {
        info!("Alert feed: {}", config.alert_feed.base_url);
        Arc::new(NwsAlertClient::new(&config.alert_feed)?)
    } else {
        info!("Alert feed disabled; fusing stored reports only");
        Arc::new(DisabledAlertSource)
    };

    let state = AppState::new(pool, engine, alerts);
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("floodmap-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
