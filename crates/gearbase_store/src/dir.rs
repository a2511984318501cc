//! Data directory management.
//!
//! This module handles the file system layout for a GearBase store:
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK                # Advisory lock for single-process access
//! ├─ assets.json         # One file per collection
//! ├─ transactions.json
//! └─ ...
//! ```
//!
//! The LOCK file ensures only one store instance can own the directory at
//! a time; the collection files are whole-file-replaced by the store.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Manages the data directory and its advisory lock.
///
/// # Thread Safety
///
/// The `DataDir` holds an exclusive lock on the directory. Only one
/// `DataDir` instance can exist per directory at a time, across processes.
#[derive(Debug)]
pub struct DataDir {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl DataDir {
    /// Opens or creates a data directory and acquires its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path exists but is not a directory (`NotADirectory`)
    /// - Another store holds the lock (`DirectoryLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(StoreError::NotADirectory(path.to_path_buf()));
        }

        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        // Non-blocking: a second opener fails immediately.
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::DirectoryLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the data directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the backing file path for a collection.
    #[must_use]
    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.path.join(format!("{collection}.json"))
    }
}
