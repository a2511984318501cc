//! Error types for token operations.

use thiserror::Error;

/// Result type for token operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Reasons a token fails verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The token is not three base64 segments, or a segment is not a
    /// valid structured document.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the received header and payload.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The payload carries no expiry claim.
    #[error("token has no expiry")]
    MissingExpiry,

    /// The embedded expiry has passed.
    #[error("token expired")]
    Expired,
}

impl AuthError {
    /// Creates a malformed-token error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
