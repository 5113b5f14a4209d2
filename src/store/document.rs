//! Whole-document JSON persistence.
//!
//! Both stores rewrite their backing file completely on every mutation. The
//! write lands in a temporary sibling first and is moved into place with a
//! rename, so a crash mid-write leaves the previous document intact.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Load a JSON document, falling back to the default value when the file is
/// missing, unreadable or unparsable. Failures are logged, not surfaced.
pub fn load_document<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}; starting empty", path.display(), e);
                T::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; starting empty", path.display(), e);
            T::default()
        }
    }
}

/// Persist a JSON document with temp-file-then-rename semantics.
pub fn save_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
