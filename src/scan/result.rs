//! Scan results and aggregate statistics.

use chrono::{DateTime, Utc};

use crate::media::{MediaCategory, MediaItem};

/// Outcome of a scan or resume pass.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The pass ran to completion. The report may still hold zero media.
    Completed(ScanReport),
    /// The fetch produced no messages; nothing was analyzed.
    NothingToScan,
}

/// Aggregate result of one completed pass.
#[derive(Debug)]
pub struct ScanReport {
    pub channel_id: u64,
    /// Wall-clock start of the logical scan (the original start for a
    /// resumed pass).
    pub started_at: DateTime<Utc>,
    pub resumed: bool,
    pub include_seen: bool,
    pub since: Option<DateTime<Utc>>,
    /// Messages iterated in this pass.
    pub messages_scanned: u32,
    /// Cumulative processed count, including a resumed prefix.
    pub processed_total: u32,
    /// Size of the history dedup set when the pass began.
    pub previously_seen: usize,
    pub media: MediaSet,
}

/// Categorized media found by one pass.
#[derive(Debug, Default)]
pub struct MediaSet {
    items: Vec<MediaItem>,
}

impl MediaSet {
    pub fn push(&mut self, item: MediaItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, category: MediaCategory) -> usize {
        self.items.iter().filter(|i| i.category == category).count()
    }

    pub fn total_bytes(&self, category: MediaCategory) -> u64 {
        self.items
            .iter()
            .filter(|i| i.category == category)
            .map(|i| i.size_bytes)
            .sum()
    }

    pub fn total_bytes_all(&self) -> u64 {
        self.items.iter().map(|i| i.size_bytes).sum()
    }

    pub fn in_category(
        &self,
        category: MediaCategory,
    ) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(move |i| i.category == category)
    }
}
