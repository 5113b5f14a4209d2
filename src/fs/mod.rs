//! File system helpers.

pub mod naming;
pub mod paths;

pub use naming::{format_display_timestamp, format_file_timestamp, safe_component};
pub use paths::{destination_dir, ensure_dir};
