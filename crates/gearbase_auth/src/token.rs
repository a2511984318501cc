//! Token issue and verification.
//!
//! ## Token Format
//!
//! Three dot-joined base64 segments:
//!
//! ```text
//! base64(header) "." base64(payload) "." base64(hmac_sha256(header "." payload, secret))
//! ```
//!
//! The header is the fixed document `{"alg":"HS256","typ":"JWT"}`; the
//! payload carries `user_id`, `username`, `role`, and `exp` (epoch
//! seconds). Verification recomputes the signature over the received
//! header and payload and compares it against the received signature.

use crate::error::{AuthError, AuthResult};
use crate::role::Role;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Server-held signing secret, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct Secret(Vec<u8>);

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret key for HMAC.
    secret: Secret,
    /// Token expiration duration.
    pub token_expiry: Duration,
}

impl AuthConfig {
    /// Creates a new auth configuration with the default 7-day expiry.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            secret: Secret(secret),
            token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Sets the token expiration duration.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Generates a random 32-byte secret.
    #[must_use]
    pub fn generate_secret() -> Vec<u8> {
        let mut bytes = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}

/// Verified identity claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id (the user record's numeric id).
    pub user_id: u64,
    /// Username of the subject.
    pub username: String,
    /// Role of the subject.
    pub role: Role,
    /// Expiry, epoch seconds.
    pub exp: u64,
}

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// Issues and verifies signed identity tokens.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: AuthConfig,
}

impl TokenCodec {
    /// Creates a new codec.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Issues a token for an identity, expiring after the configured
    /// duration.
    pub fn issue(&self, user_id: u64, username: &str, role: Role) -> String {
        let exp = now_epoch() + self.config.token_expiry.as_secs();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            role,
            exp,
        };

        let header = BASE64.encode(
            serde_json::to_vec(&HEADER).expect("header serializes to JSON"),
        );
        let payload = BASE64.encode(
            serde_json::to_vec(&claims).expect("claims serialize to JSON"),
        );
        let signature = BASE64.encode(self.sign(&header, &payload));

        format!("{header}.{payload}.{signature}")
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Malformed`] if the token is not three decodable
    ///   segments holding structured documents
    /// - [`AuthError::InvalidSignature`] if the signature does not match
    /// - [`AuthError::MissingExpiry`] / [`AuthError::Expired`] on a
    ///   missing or elapsed `exp` claim
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.verify_at(token, now_epoch())
    }

    /// Extracts an identity from a bearer-scheme authorization header.
    ///
    /// A missing header, malformed scheme, or failed verification yields
    /// `None` — the caller decides whether anonymous access is permitted.
    pub fn identity_from_header(&self, header: Option<&str>) -> Option<Claims> {
        let value = header?;
        let token = value.strip_prefix("Bearer")?.trim_start();
        if token.is_empty() {
            return None;
        }
        self.verify(token).ok()
    }

    /// Verification against an explicit clock, for expiry tests.
    fn verify_at(&self, token: &str, now: u64) -> AuthResult<Claims> {
        let mut parts = token.split('.');
        let (header, payload, signature) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(AuthError::malformed("expected three segments")),
        };

        let received = BASE64
            .decode(signature)
            .map_err(|e| AuthError::malformed(format!("signature segment: {e}")))?;
        let expected = self.sign(header, payload);
        if received != expected {
            return Err(AuthError::InvalidSignature);
        }

        let payload_bytes = BASE64
            .decode(payload)
            .map_err(|e| AuthError::malformed(format!("payload segment: {e}")))?;
        let document: serde_json::Value = serde_json::from_slice(&payload_bytes)
            .map_err(|e| AuthError::malformed(format!("payload document: {e}")))?;

        let exp = document
            .get("exp")
            .and_then(serde_json::Value::as_u64)
            .ok_or(AuthError::MissingExpiry)?;
        if exp < now {
            return Err(AuthError::Expired);
        }

        serde_json::from_value(document).map_err(|e| AuthError::malformed(e.to_string()))
    }

    /// Signs `header "." payload` with HMAC-SHA256.
    fn sign(&self, header: &str, payload: &str) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(&self.config.secret.0)
            .expect("HMAC can take key of any size");
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().into()
    }
}

/// Current time as epoch seconds.
fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
