//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Operator CLI for the channel media scanner.
#[derive(Parser, Debug)]
#[command(
    name = "chanscan",
    version,
    about = "Inspect and maintain chanscan's persisted scan state",
    long_about = "Operator utility for the channel media scanner.\n\n\
                  Scans themselves run against a live chat platform through the\n\
                  library's command router; this binary works on the persisted\n\
                  history and recovery documents."
)]
pub struct Args {
    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: StoreCommand,
}

/// Store maintenance operations.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Show a channel's scan history statistics.
    History { channel_id: u64 },

    /// Delete a channel's scan history.
    ClearHistory { channel_id: u64 },

    /// Show a channel's interrupted scan checkpoint, if any.
    CheckRecovery { channel_id: u64 },

    /// Delete a channel's recovery checkpoint.
    ClearRecovery { channel_id: u64 },
}
