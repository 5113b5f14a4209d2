//! Attachment URL classification.

use std::sync::OnceLock;

use regex::Regex;

/// Category of a media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Video,
    Other,
}

impl MediaCategory {
    /// Human-readable label used in reports and download options.
    pub fn label(&self) -> &'static str {
        match self {
            MediaCategory::Image => "Images",
            MediaCategory::Video => "Videos",
            MediaCategory::Other => "Other files",
        }
    }
}

/// The filename segment must stay within this alphabet; a recognized
/// extension on a malformed name still classifies as Other.
fn image_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://[^?\s]*/[a-z0-9_.-]+\.(jpg|jpeg|png|gif|bmp|webp)(\?.*)?$")
            .unwrap()
    })
}

fn video_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^https?://[^?\s]*/[a-z0-9_.-]+\.(mp4|avi|mov|mkv|webm|flv)(\?.*)?$")
            .unwrap()
    })
}

/// Classify an attachment URL by its filename segment.
///
/// Pure and total: anything that is not a strict match for one of the two
/// extension allowlists is [`MediaCategory::Other`].
pub fn classify(url: &str) -> MediaCategory {
    if image_pattern().is_match(url) {
        MediaCategory::Image
    } else if video_pattern().is_match(url) {
        MediaCategory::Video
    } else {
        MediaCategory::Other
    }
}
