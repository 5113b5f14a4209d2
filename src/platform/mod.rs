//! External collaborator interfaces.
//!
//! The chat-platform connection, the interactive selection prompt, the
//! report renderer and the raw HTTP fetch are all consumed through these
//! traits; the scan and download stages never talk to a concrete platform.

pub mod http;
pub mod types;

pub use http::HttpFetcher;
pub use types::{Attachment, ChannelMessage, Report, ReportField};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Read-only access to a channel's message history.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch up to `limit` messages, newest first.
    async fn fetch_history(&self, channel_id: u64, limit: u32) -> Result<Vec<ChannelMessage>>;
}

/// Interactive single-choice prompt shown to one user.
#[async_trait]
pub trait ChoicePrompt: Send + Sync {
    /// Present `options` and return the selected index, or `None` when the
    /// prompt timed out without a selection.
    async fn ask_choice(
        &self,
        user: &str,
        options: &[String],
        timeout: Duration,
    ) -> Result<Option<usize>>;
}

/// Destination for structured scan reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn post_report(&self, report: &Report) -> Result<()>;
}

/// Raw byte retrieval for a single URL.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}
