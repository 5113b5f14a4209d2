//! chanscan - resumable media scanner for chat channel history.
//!
//! This library walks a channel's reverse-chronological message history,
//! classifies attachments, deduplicates against persisted scan history,
//! checkpoints progress so an interrupted scan can resume exactly where it
//! stopped, and downloads a selected media category concurrently.
//!
//! # Features
//!
//! - Count-based and time-based history scans
//! - Persisted per-channel dedup history
//! - Crash-recoverable scan checkpoints
//! - Categorized media reports with aggregate sizes
//! - Concurrent, failure-isolated downloads
//!
//! The chat platform itself is consumed through the traits in [`platform`]:
//! wire a [`platform::MessageSource`], a [`platform::ReportSink`] and a
//! [`platform::ChoicePrompt`] to the command router in [`commands`] to host
//! the scanner on any event source.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use chanscan::{
//!     Capabilities, Command, Config, DownloadOrchestrator, HistoryStore,
//!     HttpFetcher, RecoveryStore, RequestContext, ScanEngine,
//! };
//!
//! # async fn example(
//! #     source: Arc<dyn chanscan::MessageSource>,
//! #     sink: Arc<dyn chanscan::platform::ReportSink>,
//! #     prompt: Arc<dyn chanscan::platform::ChoicePrompt>,
//! # ) -> chanscan::Result<()> {
//! let config = Config::default();
//! let engine = Arc::new(ScanEngine::new(
//!     source,
//!     HistoryStore::open(&config.storage.history_file),
//!     RecoveryStore::open(&config.storage.recovery_file),
//! ));
//! let downloader = Arc::new(DownloadOrchestrator::new(
//!     Arc::new(HttpFetcher::new(Duration::from_secs(30))?),
//!     config.download_directory(),
//! ));
//! let caps = Capabilities { engine, downloader, sink, prompt };
//!
//! let ctx = RequestContext {
//!     channel_id: 1,
//!     server_name: "server".into(),
//!     channel_name: "general".into(),
//!     user: "operator".into(),
//!     is_admin: true,
//! };
//! if let Some(command) = Command::parse_message(">scan 5") {
//!     let reply = chanscan::dispatch(command, &ctx, &caps).await?;
//!     println!("{}", reply);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;
pub mod platform;
pub mod scan;
pub mod store;

// Re-exports for convenience
pub use commands::{dispatch, Capabilities, Command, RequestContext};
pub use config::Config;
pub use download::{DownloadOrchestrator, DownloadSelection, DownloadSummary};
pub use error::{Error, Result};
pub use media::{classify, MediaCategory, MediaItem};
pub use platform::{ChannelMessage, HttpFetcher, MessageSource};
pub use scan::{ScanEngine, ScanMode, ScanOutcome, ScanParams, ScanReport};
pub use store::{HistoryStore, RecoveryStore};
