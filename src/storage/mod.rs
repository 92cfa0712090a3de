//! Storage module for persisting the mirror
//!
//! This module handles everything that touches the filesystem, including:
//! - The filesystem interface and its `std::fs` implementation
//! - The memory-bounded write buffer with its overwrite policy
//! - Mapping mirror-relative references to paths below the mirror root

mod buffer;
mod local;
mod traits;

pub use buffer::{
    local_path, BufferedStore, ContentKind, FailedEntry, FetchedBody, FlushReport, SavedEntry,
};
pub use local::LocalFileSystem;
pub use traits::{FileSystem, StorageError, StorageResult};

use std::path::Path;

/// Creates the mirror root, failing if it cannot be used
///
/// # Arguments
///
/// * `fs` - Filesystem backend
/// * `root` - Mirror root directory
///
/// # Returns
///
/// * `Ok(())` - The directory exists and is ready
/// * `Err(StorageError)` - The directory could not be created
pub fn prepare_root(fs: &dyn FileSystem, root: &Path) -> StorageResult<()> {
    fs.create_dir_all(root)?;
    if !fs.exists(root) {
        return Err(StorageError::OutsideRoot(root.display().to_string()));
    }
    Ok(())
}
