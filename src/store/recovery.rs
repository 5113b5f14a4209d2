//! In-flight scan checkpoints.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scan::params::{ScanMode, ScanParams};
use crate::store::document::{load_document, save_document};

/// Lifecycle state of a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    InProgress,
    Completed,
}

/// Persisted position and parameters of one scan.
///
/// A channel has at most one checkpoint; `InProgress` means no other scan
/// may start on that channel until it is resumed or cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryCheckpoint {
    pub scan_type: ScanMode,
    pub start_time: DateTime<Utc>,
    pub scan_params: ScanParams,
    pub status: CheckpointStatus,
    pub last_processed_message: Option<u64>,
    pub processed_count: u32,
    pub found_media: u32,
}

/// Per-channel scan checkpoints, persisted on every mutation.
#[derive(Debug)]
pub struct RecoveryStore {
    path: PathBuf,
    checkpoints: HashMap<String, RecoveryCheckpoint>,
}

impl RecoveryStore {
    /// Open the store, loading any existing document.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let checkpoints = load_document(&path);
        Self { path, checkpoints }
    }

    /// Create a fresh checkpoint, overwriting any prior one for the channel.
    ///
    /// The at-most-one-live invariant is enforced by callers checking
    /// [`RecoveryStore::interrupted`] first.
    pub fn start_session(&mut self, channel_id: u64, params: ScanParams, started_at: DateTime<Utc>) {
        let checkpoint = RecoveryCheckpoint {
            scan_type: params.mode,
            start_time: started_at,
            scan_params: params,
            status: CheckpointStatus::InProgress,
            last_processed_message: None,
            processed_count: 0,
            found_media: 0,
        };
        self.checkpoints.insert(channel_id.to_string(), checkpoint);
        self.persist();
        tracing::info!("Started scan session for channel {}", channel_id);
    }

    /// Overwrite the progress fields in place; persisted on every call.
    /// No-op when the channel has no checkpoint.
    pub fn update_progress(
        &mut self,
        channel_id: u64,
        last_message_id: Option<u64>,
        processed_count: u32,
        found_media: u32,
    ) {
        match self.checkpoints.get_mut(&channel_id.to_string()) {
            Some(checkpoint) => {
                checkpoint.last_processed_message = last_message_id;
                checkpoint.processed_count = processed_count;
                checkpoint.found_media = found_media;
            }
            None => return,
        }
        self.persist();
    }

    /// Retire the checkpoint by flipping its status to Completed.
    pub fn complete(&mut self, channel_id: u64) {
        match self.checkpoints.get_mut(&channel_id.to_string()) {
            Some(checkpoint) => checkpoint.status = CheckpointStatus::Completed,
            None => return,
        }
        self.persist();
        tracing::info!("Completed scan session for channel {}", channel_id);
    }

    /// The channel's checkpoint, only while it is still in progress.
    pub fn interrupted(&self, channel_id: u64) -> Option<&RecoveryCheckpoint> {
        self.checkpoints
            .get(&channel_id.to_string())
            .filter(|c| c.status == CheckpointStatus::InProgress)
    }

    /// The channel's checkpoint regardless of status.
    pub fn checkpoint(&self, channel_id: u64) -> Option<&RecoveryCheckpoint> {
        self.checkpoints.get(&channel_id.to_string())
    }

    /// Hard delete, discarding the record of the attempt entirely.
    pub fn clear(&mut self, channel_id: u64) {
        if self.checkpoints.remove(&channel_id.to_string()).is_some() {
            self.persist();
        }
    }

    fn persist(&self) {
        if let Err(e) = save_document(&self.path, &self.checkpoints) {
            tracing::warn!(
                "Failed to persist recovery data to {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, RecoveryStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = RecoveryStore::open(tmp.path().join("recovery.json"));
        (tmp, store)
    }

    #[test]
    fn test_session_lifecycle() {
        let (_tmp, mut store) = store();

        assert!(store.interrupted(1).is_none());

        store.start_session(1, ScanParams::count_based(Some(100), false), Utc::now());
        let checkpoint = store.interrupted(1).unwrap();
        assert_eq!(checkpoint.status, CheckpointStatus::InProgress);
        assert_eq!(checkpoint.processed_count, 0);
        assert!(checkpoint.last_processed_message.is_none());

        store.complete(1);
        assert!(store.interrupted(1).is_none());
        assert_eq!(
            store.checkpoint(1).unwrap().status,
            CheckpointStatus::Completed
        );
    }

    #[test]
    fn test_update_progress_is_monotonic_in_use() {
        let (_tmp, mut store) = store();
        store.start_session(1, ScanParams::count_based(Some(100), false), Utc::now());

        store.update_progress(1, Some(90), 10, 3);
        store.update_progress(1, Some(80), 20, 5);

        let checkpoint = store.interrupted(1).unwrap();
        assert_eq!(checkpoint.last_processed_message, Some(80));
        assert_eq!(checkpoint.processed_count, 20);
        assert_eq!(checkpoint.found_media, 5);
    }

    #[test]
    fn test_update_progress_without_session_is_noop() {
        let (_tmp, mut store) = store();
        store.update_progress(1, Some(90), 10, 3);
        assert!(store.checkpoint(1).is_none());
    }

    #[test]
    fn test_start_session_overwrites_prior_checkpoint() {
        let (_tmp, mut store) = store();
        store.start_session(1, ScanParams::count_based(Some(100), false), Utc::now());
        store.update_progress(1, Some(90), 10, 3);

        store.start_session(1, ScanParams::count_based(Some(50), true), Utc::now());
        let checkpoint = store.interrupted(1).unwrap();
        assert_eq!(checkpoint.processed_count, 0);
        assert_eq!(checkpoint.scan_params.message_limit, Some(50));
    }

    #[test]
    fn test_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("recovery.json");

        let mut store = RecoveryStore::open(&path);
        store.start_session(7, ScanParams::time_based(Some(20), false), Utc::now());
        store.update_progress(7, Some(123), 10, 2);
        drop(store);

        let store = RecoveryStore::open(&path);
        let checkpoint = store.interrupted(7).unwrap();
        assert_eq!(checkpoint.scan_type, ScanMode::TimeBased);
        assert_eq!(checkpoint.last_processed_message, Some(123));
        assert_eq!(checkpoint.processed_count, 10);
    }

    #[test]
    fn test_clear_discards_attempt() {
        let (_tmp, mut store) = store();
        store.start_session(1, ScanParams::count_based(Some(5), false), Utc::now());
        store.clear(1);
        assert!(store.checkpoint(1).is_none());
        // Idempotent.
        store.clear(1);
    }
}
