//! Error types for core operations.

use gearbase_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
///
/// All expected conditions are typed variants; only storage failures
/// (`Persistence`) are exceptional and should be surfaced as a generic
/// failure by the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record or collection is absent.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of entity searched for.
        entity: &'static str,
        /// The key that did not match.
        key: String,
    },

    /// A required input is missing or malformed.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of the invalid input.
        message: String,
    },

    /// A transition was attempted from a disallowed source state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the state mismatch.
        message: String,
    },

    /// A proposed reservation overlaps an existing one.
    #[error("reservation conflict: {message}")]
    Conflict {
        /// Description of the overlap.
        message: String,
    },

    /// No identity was presented for an operation that requires one.
    #[error("unauthorized")]
    Unauthorized,

    /// The presented identity's role does not permit the operation.
    #[error("forbidden: {message}")]
    Forbidden {
        /// Description of the missing privilege.
        message: String,
    },

    /// Backing storage is unreadable or unwritable.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl CoreError {
    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }
}
