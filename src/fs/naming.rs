//! File-name sanitization and timestamp formatting.

use chrono::{DateTime, Utc};

/// Maximum length of a sanitized path component.
const MAX_COMPONENT_LEN: usize = 50;

/// Reduce text to a safe file-name alphabet.
///
/// Keeps alphanumerics, `-`, `_` and `.`; whitespace becomes `_`; everything
/// else is dropped. Consecutive underscores collapse to one and the result is
/// capped at 50 characters.
pub fn safe_component(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            kept.push(c);
        } else if c.is_whitespace() {
            kept.push('_');
        }
    }

    let mut collapsed = String::with_capacity(kept.len());
    let mut prev_underscore = false;
    for c in kept.chars() {
        if c == '_' {
            if !prev_underscore {
                collapsed.push(c);
            }
            prev_underscore = true;
        } else {
            collapsed.push(c);
            prev_underscore = false;
        }
    }

    collapsed
        .trim_matches('_')
        .chars()
        .take(MAX_COMPONENT_LEN)
        .collect()
}

/// Timestamp format used inside generated file and folder names.
pub fn format_file_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Timestamp format used in reports and console output.
pub fn format_display_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M:%S").to_string()
}
