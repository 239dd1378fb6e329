//! CLI definitions for webflow.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// webflow CLI.
#[derive(Parser)]
#[command(name = "webflow")]
#[command(about = "Record a browser session and replay it with realistic timing")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "webflow.toml", global = true, env = "WEBFLOW_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Open a browser and record everything done in it until Ctrl-C
    Record {
        /// Start URL (overrides recording.url)
        #[arg(long)]
        url: Option<String>,

        /// Output directory (overrides recording.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay a recorded session file
    Replay {
        /// Path to a session-*.jsonl file
        path: PathBuf,

        /// Speed multiplier (overrides replay.timescale)
        #[arg(long)]
        timescale: Option<f64>,

        /// Keep the browser open for at least a minute after the last step
        #[arg(long)]
        keep_open: bool,
    },

    /// Summarize a recorded session file
    Inspect {
        /// Path to a session-*.jsonl file
        path: PathBuf,
    },
}
