//! Cache storage collaborators.
//!
//! Storage is a byte store keyed by name. The cache manager owns the
//! artifact layout; implementations only need atomic replace on write.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::types::{EcError, EcResult};

/// A byte-oriented key/value store with atomic replace.
pub trait CacheStorage {
    /// Reads the bytes stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> EcResult<Option<Vec<u8>>>;

    /// Replaces the bytes under `key`. Readers see either the old or the
    /// new content, never a partial write.
    fn write(&self, key: &str, bytes: &[u8]) -> EcResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> EcResult<()>;
}

/// Stores each key as a file in a directory.
///
/// Writes go to a uniquely named temporary file in the same directory
/// which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path used for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl CacheStorage for FsStorage {
    fn read(&self, key: &str) -> EcResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EcError::io_error(path, e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> EcResult<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|e| EcError::io_error(&self.dir, e))?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| EcError::io_error(&self.dir, e))?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| EcError::io_error(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| EcError::io_error(&path, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> EcResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EcError::io_error(path, e)),
        }
    }
}

/// Process-local store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheStorage for MemoryStorage {
    fn read(&self, key: &str) -> EcResult<Option<Vec<u8>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> EcResult<()> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> EcResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
