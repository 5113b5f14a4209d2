//! Error types for the chanscan application.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Scan lifecycle errors
    #[error("A scan is already active in channel {0}")]
    ScanAlreadyActive(u64),

    #[error("Channel {0} has an unfinished scan; resume it or clear recovery first")]
    UnresolvedRecovery(u64),

    #[error("No previous scan recorded for channel {0}; run a count-based scan first")]
    NoHistoryAvailable(u64),

    #[error("No interrupted scan to resume in channel {0}")]
    NothingToResume(u64),

    // Message source errors
    #[error("Message source error: {0}")]
    Fetch(String),

    // Download errors
    #[error("Download failed: {0}")]
    Download(String),

    // Prompt errors
    #[error("Selection prompt error: {0}")]
    Prompt(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes for the operator binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_ERROR: i32 = 3;
    pub const STORE_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
