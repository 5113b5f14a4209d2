//! Scan orchestration.
//!
//! This module provides:
//! - Scan request parameters
//! - Paged message retrieval with resume anchors
//! - The resumable scan engine
//! - Scan result types

pub mod engine;
pub mod fetcher;
pub mod params;
pub mod result;

pub use engine::ScanEngine;
pub use fetcher::PageFetcher;
pub use params::{ScanMode, ScanParams, DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT};
pub use result::{MediaSet, ScanOutcome, ScanReport};
