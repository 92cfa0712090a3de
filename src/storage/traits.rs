//! Storage traits and error types
//!
//! This module defines the filesystem interface the mirror is written through
//! and the associated error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Path escapes the mirror root: {0}")]
    OutsideRoot(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for filesystem backends
///
/// The mirror only ever needs these four operations, which keeps the crawl
/// testable against an in-memory or failing implementation.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Creates a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Writes a file, replacing any previous content
    fn write(&self, path: &Path, contents: &[u8]) -> StorageResult<()>;
}
