//! Run report types
//!
//! This module defines the record every run produces and the errors that can
//! occur while writing it.

use crate::output::Statistics;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Overall outcome of a run
///
/// A run succeeds once at least one flush persisted content without a
/// filesystem error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything recorded about one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The starting link as given
    pub request: String,

    pub started_at: DateTime<FixedOffset>,

    pub elapsed: Duration,

    pub status: RunStatus,

    /// True if the run was interrupted before its depth was exhausted
    pub cancelled: bool,

    /// Mirror root directory
    pub mirror_root: String,

    /// Hash of the configuration file, if one was used
    pub config_hash: Option<String>,

    /// Reason the run could not start, if any
    pub error: Option<String>,

    pub statistics: Statistics,
}

impl RunReport {
    /// Report for a run that could not start
    pub fn failed(
        request: &str,
        started_at: DateTime<FixedOffset>,
        mirror_root: &str,
        error: String,
    ) -> Self {
        Self {
            request: request.to_string(),
            started_at,
            elapsed: Duration::ZERO,
            status: RunStatus::Failed,
            cancelled: false,
            mirror_root: mirror_root.to_string(),
            config_hash: None,
            error: Some(error),
            statistics: Statistics::default(),
        }
    }

    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }
}
