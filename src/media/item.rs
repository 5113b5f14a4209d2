//! Media item representation.

use chrono::{DateTime, Utc};

use crate::fs::naming::{format_file_timestamp, safe_component};
use crate::media::classify::{classify, MediaCategory};
use crate::platform::{Attachment, ChannelMessage};

/// A media attachment discovered during a scan.
///
/// Immutable once built; owned by the scan result until the downloads for
/// that scan complete.
#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Source URL of the attachment.
    pub url: String,

    /// Generated file name, `{ordinal:04}_{timestamp}_{author}.{ext}`.
    pub file_name: String,

    /// Classification of the attachment.
    pub category: MediaCategory,

    /// Reported size in bytes.
    pub size_bytes: u64,

    /// Id of the message carrying the attachment.
    pub message_id: u64,

    /// When the carrying message was posted.
    pub posted_at: DateTime<Utc>,

    /// Author of the carrying message.
    pub author: String,
}

impl MediaItem {
    /// Build an item from one attachment, assigning its ordinal file name.
    pub fn from_attachment(
        attachment: &Attachment,
        message: &ChannelMessage,
        ordinal: u32,
    ) -> Self {
        let file_name = format!(
            "{:04}_{}_{}.{}",
            ordinal,
            format_file_timestamp(message.created_at),
            safe_component(&message.author),
            url_extension(&attachment.url),
        );

        Self {
            url: attachment.url.clone(),
            file_name,
            category: classify(&attachment.url),
            size_bytes: attachment.size_bytes,
            message_id: message.id,
            posted_at: message.created_at,
            author: message.author.clone(),
        }
    }
}

/// File extension from a URL, query string stripped.
fn url_extension(url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let filename = path.rsplit('/').next().unwrap_or(path);

    if !filename.contains('.') {
        return "bin".to_string();
    }

    match filename.rsplit('.').next() {
        Some(ext)
            if !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_lowercase()
        }
        _ => "bin".to_string(),
    }
}
