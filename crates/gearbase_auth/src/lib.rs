//! # GearBase Auth
//!
//! Stateless token codec for GearBase.
//!
//! Tokens are three dot-joined base64 segments — header, payload, and an
//! HMAC-SHA256 signature over `header "." payload` — carrying identity,
//! role, and expiry. There is no server-side session state and no
//! revocation list: a token is valid until its embedded expiry regardless
//! of later privilege changes. That is the stateless-authentication
//! trade-off, accepted by design.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gearbase_auth::{AuthConfig, Role, TokenCodec};
//!
//! let codec = TokenCodec::new(AuthConfig::new(AuthConfig::generate_secret()));
//! let token = codec.issue(1, "alice", Role::Admin)?;
//! let claims = codec.verify(&token)?;
//! assert_eq!(claims.username, "alice");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod role;
mod token;

pub use error::{AuthError, AuthResult};
pub use role::Role;
pub use token::{AuthConfig, Claims, TokenCodec};
