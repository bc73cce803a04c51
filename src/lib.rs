//! Corpus-Harvester: an incremental text corpus crawler
//!
//! This crate harvests text documents from a local filesystem tree, a static
//! literature archive and a paginated forum API into a durable corpus. Every
//! source implements the same [`crawler::Crawler`] contract, so the driver loop
//! never needs source-specific code.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::FetchError;

/// Main error type for Corpus-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configured root directory {path} is not readable: {source}")]
    MissingRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of every failure the harvester can observe
///
/// Crawlers branch on this instead of inspecting error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The remote side asked us to back off (HTTP 503)
    Throttled,
    /// Network or I/O hiccup; the item is abandoned for this pass
    Transient,
    /// The remote answered, but with content we cannot use
    Malformed,
    /// Misconfiguration; the only class that aborts a crawler's initialization
    ConfigFatal,
}

impl HarvestError {
    /// Maps this error onto the harvesting error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::Config(_) | Self::UrlParse(_) | Self::MissingRoot { .. } => {
                ErrorKind::ConfigFatal
            }
            Self::Json(_) => ErrorKind::Malformed,
            Self::Reqwest(_) | Self::Storage(_) | Self::Database(_) | Self::Io(_) => {
                ErrorKind::Transient
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Corpus-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Crawler, Driver, FetchResult};
pub use storage::{SharedStore, SqliteStorage};
