//! Durable key-value stores.
//!
//! The dependency map, the circular pair set and manual edits are each kept
//! as one opaque string blob under a fixed key. [`FileStore`] keeps one file
//! per key inside a state directory; [`MemoryStore`] keeps them in a map and
//! is used by tests and embedders that persist elsewhere.

use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::lock::StoreLock;
use crate::core::SlimError;
use crate::utils::fs::atomic_write;

/// Minimal key-value persistence used by the map cache.
pub trait KeyValueStore {
    /// Read the blob stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// Store keeping each key in `{state_dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::from(e)).context(SlimError::StoreError {
                operation: "read".to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _lock = StoreLock::acquire(&self.dir, key)?;
        atomic_write(&self.key_path(key), value.as_bytes()).context(SlimError::StoreError {
            operation: "write".to_string(),
            key: key.to_string(),
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(());
        }
        let _lock = StoreLock::acquire(&self.dir, key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::from(e)).context(SlimError::StoreError {
                operation: "delete".to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// Store holding blobs in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
