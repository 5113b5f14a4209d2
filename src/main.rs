//! chanscan - operator CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, EnvFilter};

use chanscan::{
    cli::{Args, StoreCommand},
    config::Config,
    error::{exit_codes, Error, Result},
    fs::naming::format_display_timestamp,
    output::{print_error, print_info, print_success, print_warning},
    store::{CheckpointStatus, HistoryStore, RecoveryStore},
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Io(_) | Error::Json(_) => ExitCode::from(exit_codes::STORE_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    // Load configuration
    let config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration");
        Config::default()
    };

    match args.command {
        StoreCommand::History { channel_id } => {
            let store = HistoryStore::open(&config.storage.history_file);
            let stats = store.stats(channel_id);

            println!(
                "{}",
                style(format!("Scan history for channel {}:", channel_id)).bold()
            );
            println!("  Media scanned: {}", stats.total_scanned);
            println!("  Scans run:     {}", stats.total_scans);
            match stats.last_scan {
                Some(at) => println!("  Last scan:     {}", format_display_timestamp(at)),
                None => println!("  Last scan:     never"),
            }
        }
        StoreCommand::ClearHistory { channel_id } => {
            let mut store = HistoryStore::open(&config.storage.history_file);
            store.clear(channel_id);
            print_success(&format!("Cleared scan history for channel {}", channel_id));
        }
        StoreCommand::CheckRecovery { channel_id } => {
            let store = RecoveryStore::open(&config.storage.recovery_file);
            match store.interrupted(channel_id) {
                Some(checkpoint) => {
                    println!(
                        "{}",
                        style(format!("Interrupted scan in channel {}:", channel_id)).bold()
                    );
                    println!(
                        "  Started:            {}",
                        format_display_timestamp(checkpoint.start_time)
                    );
                    println!("  Scan type:          {}", checkpoint.scan_type);
                    println!("  Messages processed: {}", checkpoint.processed_count);
                    println!("  Media found:        {}", checkpoint.found_media);
                }
                None => match store.checkpoint(channel_id) {
                    Some(checkpoint) if checkpoint.status == CheckpointStatus::Completed => {
                        print_info(&format!(
                            "No interrupted scan; the last scan in channel {} completed at {}.",
                            channel_id,
                            format_display_timestamp(checkpoint.start_time)
                        ));
                    }
                    _ => {
                        print_info(&format!(
                            "No scan checkpoint recorded for channel {}.",
                            channel_id
                        ));
                    }
                },
            }
        }
        StoreCommand::ClearRecovery { channel_id } => {
            let mut store = RecoveryStore::open(&config.storage.recovery_file);
            store.clear(channel_id);
            print_success(&format!(
                "Cleared recovery data for channel {}",
                channel_id
            ));
        }
    }

    Ok(())
}
