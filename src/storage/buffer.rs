use crate::storage::traits::{FileSystem, StorageError, StorageResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a fetched body is treated after it is saved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Candidate for link rewriting
    Html,
    Binary,
}

/// A fetched body waiting to be persisted
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Registry key of the link the body belongs to
    pub key: String,

    /// Mirror-relative directory, empty or starting with '/'
    pub directory: String,

    /// File name starting with '/'
    pub filename: String,

    pub body: Vec<u8>,

    pub content: ContentKind,
}

/// An entry that left the buffer successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    pub key: String,
    pub path: PathBuf,
    pub content: ContentKind,

    /// False when an existing file was kept because overwriting is off
    pub written: bool,
}

/// An entry that could not be persisted
#[derive(Debug)]
pub struct FailedEntry {
    pub key: String,
    pub path: PathBuf,
    pub error: StorageError,
}

/// Outcome of one flush
#[derive(Debug, Default)]
pub struct FlushReport {
    pub saved: Vec<SavedEntry>,
    pub failed: Vec<FailedEntry>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty() && self.failed.is_empty()
    }

    /// Whether the flush persisted something and hit no filesystem error
    pub fn is_clean(&self) -> bool {
        !self.saved.is_empty() && self.failed.is_empty()
    }

    pub fn written_count(&self) -> usize {
        self.saved.iter().filter(|e| e.written).count()
    }

    pub fn kept_count(&self) -> usize {
        self.saved.iter().filter(|e| !e.written).count()
    }
}

/// Holds fetched bodies in memory and writes them out in batches
///
/// At most `capacity` bodies are held at once: the put that fills the buffer
/// flushes it. A capacity of 0 behaves like 1.
pub struct BufferedStore {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    capacity: usize,
    force: bool,
    buffer: Vec<FetchedBody>,
    peak: usize,
}

impl BufferedStore {
    /// Creates a store writing below `root`
    ///
    /// # Arguments
    ///
    /// * `fs` - Filesystem backend
    /// * `root` - Mirror root directory
    /// * `capacity` - Number of bodies held before a flush
    /// * `force` - Overwrite files that already exist
    pub fn new(fs: Arc<dyn FileSystem>, root: PathBuf, capacity: usize, force: bool) -> Self {
        Self {
            fs,
            root,
            capacity: capacity.max(1),
            force,
            buffer: Vec::new(),
            peak: 0,
        }
    }

    /// Buffers a body, flushing when the buffer reaches capacity
    ///
    /// # Returns
    ///
    /// * `Some(FlushReport)` - The put triggered a flush
    /// * `None` - The body is waiting in the buffer
    pub fn put(&mut self, body: FetchedBody) -> Option<FlushReport> {
        self.buffer.push(body);
        self.peak = self.peak.max(self.buffer.len());

        if self.buffer.len() >= self.capacity {
            Some(self.flush())
        } else {
            None
        }
    }

    /// Persists every buffered body and empties the buffer
    ///
    /// Failed entries are dropped from the buffer and reported, never retried.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();

        for entry in self.buffer.drain(..) {
            let path = match local_path(&self.root, &entry.directory, &entry.filename) {
                Ok(path) => path,
                Err(error) => {
                    report.failed.push(FailedEntry {
                        key: entry.key,
                        path: self.root.clone(),
                        error,
                    });
                    continue;
                }
            };

            match persist(self.fs.as_ref(), &path, &entry.body, self.force) {
                Ok(written) => report.saved.push(SavedEntry {
                    key: entry.key,
                    path,
                    content: entry.content,
                    written,
                }),
                Err(error) => report.failed.push(FailedEntry {
                    key: entry.key,
                    path,
                    error,
                }),
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest number of bodies held at once so far
    pub fn peak(&self) -> usize {
        self.peak
    }
}

/// Writes one body; returns false when an existing file was kept
fn persist(fs: &dyn FileSystem, path: &Path, body: &[u8], force: bool) -> StorageResult<bool> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }

    if !force && fs.exists(path) {
        return Ok(false);
    }

    fs.write(path, body)?;
    Ok(true)
}

/// Joins a mirror-relative directory and filename onto the root
pub fn local_path(root: &Path, directory: &str, filename: &str) -> StorageResult<PathBuf> {
    let relative = format!("{}{}", directory, filename);
    let mut path = root.to_path_buf();

    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        if segment == ".." || segment == "." {
            return Err(StorageError::OutsideRoot(relative));
        }
        path.push(segment);
    }

    if path == root {
        return Err(StorageError::OutsideRoot(relative));
    }

    Ok(path)
}
