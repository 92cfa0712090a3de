//! Sumi-Mirror: an offline web site mirror
//!
//! This crate fetches a starting page, follows embedded resources and hyperlinks
//! up to a configured depth, maps every discovered link to a deterministic local
//! path, and rewrites saved HTML so the mirror can be browsed without a network.

pub mod config;
pub mod crawler;
pub mod output;
pub mod rewrite;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Mirror operations
///
/// Only configuration errors and an unusable output root abort a run. The
/// per-link variants are built for logging and counted; the crawl continues.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Report error: {0}")]
    Report(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output root {path} is unusable: {source}")]
    OutputRoot {
        path: String,
        source: storage::StorageError,
    },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Failed to persist {path}: {source}")]
    PersistenceFailed {
        path: String,
        source: storage::StorageError,
    },

    #[error("Failed to rewrite {path}: {reason}")]
    RewriteFailed { path: String, reason: String },
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

    #[error("Invalid blacklist pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Link-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Link is blacklisted: {0}")]
    BlacklistedLink(String),

    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    #[error("Unsupported scheme in reference: {0}")]
    UnsupportedScheme(String),
}

/// Result type alias for Sumi-Mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlOptions};
pub use crawler::Coordinator;
pub use output::{RunReport, RunStatus, Statistics};
pub use state::{AssetKind, LinkRecord};
pub use url::{canonicalize, classify, CanonicalUrl, ConnectionContext};
