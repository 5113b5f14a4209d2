//! Scan request parameters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on messages per scan request.
pub const MAX_MESSAGE_LIMIT: u32 = 500;

/// Message count used for a plain `scan` request with no arguments.
pub const DEFAULT_MESSAGE_LIMIT: u32 = 5;

/// How a scan selects messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Walk the most recent N messages.
    CountBased,
    /// Walk messages newer than a cutoff timestamp.
    TimeBased,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::CountBased => write!(f, "count_based"),
            ScanMode::TimeBased => write!(f, "time_based"),
        }
    }
}

/// Immutable parameters of one scan request.
///
/// Persisted verbatim inside the recovery checkpoint so a resume
/// reconstructs the exact original intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanParams {
    pub mode: ScanMode,
    pub message_limit: Option<u32>,
    pub include_seen: bool,
    pub since: Option<DateTime<Utc>>,
}

impl ScanParams {
    /// Count-based request over the latest messages.
    pub fn count_based(limit: Option<u32>, include_seen: bool) -> Self {
        Self {
            mode: ScanMode::CountBased,
            message_limit: limit.map(|n| n.min(MAX_MESSAGE_LIMIT)),
            include_seen,
            since: None,
        }
    }

    /// Time-based request since the previous scan.
    ///
    /// The cutoff is left unset here; the engine fills it in from the
    /// channel's history record when the scan starts.
    pub fn time_based(limit: Option<u32>, include_seen: bool) -> Self {
        Self {
            mode: ScanMode::TimeBased,
            message_limit: limit.map(|n| n.min(MAX_MESSAGE_LIMIT)),
            include_seen,
            since: None,
        }
    }

    /// Effective message cap for fetching.
    pub fn effective_limit(&self) -> u32 {
        self.message_limit
            .unwrap_or(MAX_MESSAGE_LIMIT)
            .min(MAX_MESSAGE_LIMIT)
    }
}
