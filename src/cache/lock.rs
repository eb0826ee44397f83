//! File locking for the durable store.
//!
//! Writers to the state directory take an exclusive lock on
//! `{state_dir}/.locks/{name}.lock` so two processes never interleave
//! writes to the same blob. The lock is released when the [`StoreLock`] is
//! dropped.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::utils::fs::ensure_dir;

/// An exclusive file lock held for the lifetime of the value.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire an exclusive lock named `name` inside `state_dir`.
    ///
    /// Blocks until any other holder releases it.
    pub fn acquire(state_dir: &Path, name: &str) -> Result<Self> {
        let locks_dir = state_dir.join(".locks");
        ensure_dir(&locks_dir)?;

        let lock_path = locks_dir.join(format!("{name}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        file.lock_exclusive().with_context(|| format!("Failed to acquire lock for: {name}"))?;

        Ok(Self {
            _file: file,
            path: lock_path,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self._file.unlock() {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
