//! curate-server - curation review service
//!
//! Loads the bootstrap config, resolves and initializes the backend folder,
//! and serves the curation API until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use curate_common::auth;
use curate_common::config::{
    default_config_path, load_toml_config, BackendFolderInitializer, BackendFolderResolver,
    LoggingConfig,
};
use curate_server::{build_router, AppState};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "curate-server")]
#[command(about = "Review service for copy-number solution curation")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "CURATE_CONFIG")]
    config: Option<PathBuf>,

    /// Backend folder holding the project registry (overrides env and config)
    #[arg(short, long)]
    backend_folder: Option<PathBuf>,

    /// Address to listen on (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Default::default(),
    };

    init_tracing(&config.logging)?;

    // Build identification first, before any slow startup work
    info!(
        "Starting ichor-curate review service (curate-server) v{}",
        env!("CARGO_PKG_VERSION")
    );
    match &config_path {
        Some(path) if path.is_file() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => warn!("No config directory on this platform, using defaults"),
    }

    let backend = BackendFolderResolver::new()
        .with_cli_arg(args.backend_folder)
        .with_config(&config)
        .resolve();
    let registry = BackendFolderInitializer::new(backend.clone())
        .initialize()
        .with_context(|| format!("Failed to open backend folder {}", backend.display()))?;
    info!(
        "✓ Backend folder {} ({} projects)",
        backend.display(),
        registry.projects().count()
    );

    let authenticator = auth::from_config(&config.auth);
    let state = AppState::new(backend, authenticator, config.summary.format())
        .with_session_idle_timeout(Duration::from_secs(config.session_idle_minutes * 60));
    info!("Session idle timeout: {} minutes", config.session_idle_minutes);
    let app = build_router(state);

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("curate-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
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

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
