//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub downloads: DownloadsConfig,
}

/// Persisted store locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Scan history document.
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Recovery checkpoint document.
    #[serde(default = "default_recovery_file")]
    pub recovery_file: PathBuf,
}

/// Download behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadsConfig {
    /// Root directory for download batches; defaults to `./downloads`.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Per-request timeout for file fetches, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            recovery_file: default_recovery_file(),
        }
    }
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            directory: None,
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_history_file() -> PathBuf {
    PathBuf::from("scan_history.json")
}

fn default_recovery_file() -> PathBuf {
    PathBuf::from("scan_recovery.json")
}

fn default_request_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the effective download root directory.
    pub fn download_directory(&self) -> PathBuf {
        self.downloads.directory.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("downloads")
        })
    }
}
