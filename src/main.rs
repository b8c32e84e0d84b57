//! Livecap - Live Video Captioning
//!
//! This is the main entry point for the livecap application, which
//! transcribes a video file while it is still being recorded, appending
//! translated SRT captions that a media player can pick up mid-playback.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use livecap::cli::{Args, Commands};
use livecap::config::Config;
use livecap::error::LivecapError;
use livecap::player::PlayerController;
use livecap::workflow::CaptionWorkflow;

const DEFAULT_CONFIG_FILE: &str = "livecap.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    match args.command {
        Commands::Init { force } => {
            let path = args
                .config
                .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
            init_config(&path, force)?;
        }
        Commands::Transcribe => {
            let config = load_config(args.config.as_deref())?;
            config.validate_transcribe()?;

            let cancel = CancellationToken::new();
            spawn_ctrl_c_handler(cancel.clone());

            info!("Captioning {}", config.video.input_path);
            let workflow = CaptionWorkflow::new(config)?;
            workflow.run(cancel).await?;
        }
        Commands::Play => {
            let config = load_config(args.config.as_deref())?;
            config.validate_play()?;

            let cancel = CancellationToken::new();
            spawn_ctrl_c_handler(cancel.clone());

            info!("Launching player for {}", config.video.input_path);
            let controller = PlayerController::new(config)?;
            controller.run(cancel).await?;
        }
    }

    info!("Livecap finished");
    Ok(())
}

/// Resolve the configuration file: an explicit --config path wins,
/// otherwise livecap.toml in the current directory.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(Config::from_file(path)?)
        }
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Loading {} from current directory", DEFAULT_CONFIG_FILE);
                Ok(Config::from_file(DEFAULT_CONFIG_FILE)?)
            } else {
                Err(LivecapError::Config(format!(
                    "No {} found. Run `livecap init` to create one",
                    DEFAULT_CONFIG_FILE
                ))
                .into())
            }
        }
    }
}

/// Write a default configuration file for the user to edit.
fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(LivecapError::Config(format!(
            "{} already exists, pass --force to overwrite",
            path.display()
        ))
        .into());
    }

    Config::default().save_to_file(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Edit the [video] and [player] sections before running livecap");
    Ok(())
}

/// Cancel the token on Ctrl-C so both loops can wind down cleanly.
fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            cancel.cancel();
        }
    });
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let livecap_dir = std::env::current_dir()?.join(".livecap");
    let log_dir = livecap_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "livecap.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    // Initialize the subscriber
    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
