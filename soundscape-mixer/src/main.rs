//! Soundscape mixer - Main entry point
//!
//! Loads the channel catalogue, starts the mix engine and serves the HTTP
//! control API until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use soundscape_common::config::MixerConfig;
use soundscape_mixer::device::LoggingDevice;
use soundscape_mixer::{api, MixEngine};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for soundscape-mixer
#[derive(Parser, Debug)]
#[command(name = "soundscape-mixer")]
#[command(about = "Ambient soundscape mixer with HTTP control")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SOUNDSCAPE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SOUNDSCAPE_PORT")]
    port: Option<u16>,

    /// Folder containing the channel sound files (overrides the config file)
    #[arg(short, long)]
    sounds_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MixerConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(folder) = args.sounds_folder {
        config.sounds_folder = Some(folder);
    }

    // Initialize tracing; RUST_LOG wins over the config file level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "soundscape_mixer={0},soundscape_common={0},tower_http=info",
                    config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting soundscape mixer on port {}", config.server.port);
    match &config.sounds_folder {
        Some(folder) => info!("Sounds folder: {}", folder.display()),
        None => info!("No sounds folder configured, all sources accepted"),
    }

    let device = LoggingDevice::new(config.sounds_folder.clone());
    let engine = Arc::new(MixEngine::new(&config, &device));
    engine.start().await;

    api::run(config.server.port, Arc::clone(&engine), shutdown_signal())
        .await
        .context("HTTP server failed")?;

    engine.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
