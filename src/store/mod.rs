//! Persisted per-channel stores.
//!
//! This module provides:
//! - Whole-document JSON persistence with atomic replacement
//! - The scan history store (dedup set + counters)
//! - The recovery store (in-flight scan checkpoints)

pub mod document;
pub mod history;
pub mod recovery;

pub use history::{ChannelStats, HistoryRecord, HistoryStore};
pub use recovery::{CheckpointStatus, RecoveryCheckpoint, RecoveryStore};
