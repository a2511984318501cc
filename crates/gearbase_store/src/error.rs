//! Error types for store operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A backing file exists but does not hold a valid record array.
    ///
    /// This is a hard error rather than an empty collection: silently
    /// masking corruption would drop the whole collection on the next
    /// whole-file write.
    #[error("collection file corrupted: {collection}: {message}")]
    Corrupt {
        /// Name of the collection whose file is unreadable.
        collection: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Another store instance holds the data directory lock.
    #[error("data directory locked: another process has exclusive access")]
    DirectoryLocked,

    /// The data directory path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl StoreError {
    /// Creates a corruption error for a collection.
    pub fn corrupt(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            collection: collection.into(),
            message: message.into(),
        }
    }
}
