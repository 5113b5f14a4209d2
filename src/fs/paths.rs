//! Download destination directories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::fs::naming::{format_file_timestamp, safe_component};

/// Build the destination directory for one download batch.
///
/// The name combines the server and channel identity with the scan's
/// wall-clock start so repeated scans never collide.
pub fn destination_dir(
    root: &Path,
    server_name: &str,
    channel_name: &str,
    started_at: DateTime<Utc>,
) -> PathBuf {
    let folder = format!(
        "{}_{}_{}",
        safe_component(server_name),
        safe_component(channel_name),
        format_file_timestamp(started_at),
    );
    root.join(folder)
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        tracing::info!("Created folder: {}", path.display());
    }
    Ok(())
}
