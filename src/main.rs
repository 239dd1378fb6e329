//! webflow - record a browser session and replay it.
//!
//! Main entry point for the webflow CLI.

mod cli;
mod cmd_inspect;
mod cmd_record;
mod cmd_replay;
mod options;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webflow_config::{Config, ConfigLoader, ConfigValidator};

use cli::{Cli, Commands};

/// `~/.webflow`, or `./.webflow` without a home directory.
fn webflow_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".webflow")
}

/// Initialize tracing with console and daily-rotated file output.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = webflow_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("webflow")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the file writer.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load and validate the config, falling back to defaults when the file is missing.
fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let (config, found) = ConfigLoader::load_or_default(path)?;
    if found {
        info!("Loaded config from {}", path.display());
    } else {
        warn!("Config file {} not found, using defaults", path.display());
    }

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Record { url, output } => {
            let config = load_config(&cli.config)?;
            cmd_record::run(config, url, output).await
        }
        Commands::Replay {
            path,
            timescale,
            keep_open,
        } => {
            let config = load_config(&cli.config)?;
            cmd_replay::run(config, &path, timescale, keep_open).await
        }
        Commands::Inspect { path } => cmd_inspect::run(&path).await,
    }
}
