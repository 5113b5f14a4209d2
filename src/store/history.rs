//! Per-channel scan history.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::document::{load_document, save_document};

/// Persisted record for one channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub scanned_urls: BTreeSet<String>,
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_scans: u32,
}

/// Aggregate statistics for one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub total_scanned: usize,
    pub last_scan: Option<DateTime<Utc>>,
    pub total_scans: u32,
}

/// Append-only record of media URLs already reported, per channel.
///
/// The URL set only grows; it is a pure membership filter for "media already
/// reported before". Write failures are logged and swallowed: the in-memory
/// state stays correct for the running process, durability for the next
/// start is not guaranteed.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    records: HashMap<String, HistoryRecord>,
}

impl HistoryStore {
    /// Open the store, loading any existing document.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_document(&path);
        Self { path, records }
    }

    /// URLs already reported for a channel; empty when none recorded.
    pub fn seen_urls(&self, channel_id: u64) -> HashSet<String> {
        self.records
            .get(&channel_id.to_string())
            .map(|r| r.scanned_urls.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// When the channel was last scanned successfully.
    pub fn last_scan_time(&self, channel_id: u64) -> Option<DateTime<Utc>> {
        self.records
            .get(&channel_id.to_string())
            .and_then(|r| r.last_scan)
    }

    /// Merge newly found URLs into the channel record.
    ///
    /// Union, never replace. Moves `last_scan` to now, bumps the invocation
    /// counter and rewrites the document synchronously.
    pub fn record_new_urls(&mut self, channel_id: u64, urls: &HashSet<String>) {
        {
            let record = self.records.entry(channel_id.to_string()).or_default();
            record.scanned_urls.extend(urls.iter().cloned());
            record.last_scan = Some(Utc::now());
            record.total_scans += 1;
        }
        self.persist();
    }

    /// Aggregate statistics for a channel.
    pub fn stats(&self, channel_id: u64) -> ChannelStats {
        self.records
            .get(&channel_id.to_string())
            .map(|r| ChannelStats {
                total_scanned: r.scanned_urls.len(),
                last_scan: r.last_scan,
                total_scans: r.total_scans,
            })
            .unwrap_or_default()
    }

    /// Remove the channel's record entirely. Idempotent.
    pub fn clear(&mut self, channel_id: u64) {
        if self.records.remove(&channel_id.to_string()).is_some() {
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(e) = save_document(&self.path, &self.records) {
            tracing::warn!(
                "Failed to persist scan history to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}
