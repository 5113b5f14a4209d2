//! Concurrent media downloading.

pub mod batch;

pub use batch::{DownloadOrchestrator, DownloadSelection, DownloadSummary};
