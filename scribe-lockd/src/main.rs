//! scribe-lockd - reference lock server for the session endpoints
//!
//! Not the archive backend: state lives in memory and is gone on restart.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scribe_common::config::TomlConfig;
use scribe_common::logging::init_tracing;
use scribe_lockd::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};

/// Command-line arguments for scribe-lockd
#[derive(Parser, Debug)]
#[command(name = "scribe-lockd")]
#[command(about = "Reference lock server for transcription sessions")]
#[command(version)]
struct Args {
    /// Config file (default: platform config dir)
    #[arg(short, long, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "SCRIBE_LOCKD_PORT")]
    port: Option<u16>,

    /// Expire locks untouched for this many seconds, overrides the config file
    #[arg(long)]
    lock_ttl_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.lockd.port = port;
    }
    if args.lock_ttl_secs.is_some() {
        config.lockd.lock_ttl_secs = args.lock_ttl_secs;
    }

    init_tracing(&config.logging.level);
    info!(
        "Starting scribe-lockd v{}",
        env!("CARGO_PKG_VERSION")
    );
    let state = AppState::new(config.lockd.lock_ttl());
    match state.locks.ttl() {
        Some(ttl) => info!("Locks expire after {}s without activity", ttl.as_secs()),
        None => info!("Locks never expire"),
    }

    let app = build_router(state);

    let addr = config.lockd.socket_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("scribe-lockd listening on http://{}", addr);
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
