//! Key-value storage for history checkpoints.
//!
//! History keeps its index and every checkpoint as string values under
//! string keys. [`MemoryCheckpointStore`] keeps them in a map;
//! [`FileCheckpointStore`] writes one JSON file per key into a data
//! directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Storage backend for history checkpoints.
pub trait CheckpointStore {
    /// Read a value. Missing keys yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read an existing value.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn put(&mut self, key: &str, value: String) -> CoreResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete an existing value.
    fn remove(&mut self, key: &str) -> CoreResult<()>;
}

/// In-memory checkpoint storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    entries: HashMap<String, String>,
}

impl MemoryCheckpointStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> CoreResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Checkpoint storage backed by one JSON file per key.
///
/// Empty keys are rejected with [`CoreError::Storage`].
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    data_dir: PathBuf,
}

impl FileCheckpointStore {
    /// Open a store in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    /// The directory holding checkpoint files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> CoreResult<PathBuf> {
        if key.is_empty() {
            return Err(CoreError::Storage("empty checkpoint key".into()));
        }
        Ok(self.data_dir.join(format!("{}.json", sanitize_filename(key))))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: String) -> CoreResult<()> {
        std::fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> CoreResult<()> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Replace anything but ASCII alphanumerics, `-` and `_` with `_`.
fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
