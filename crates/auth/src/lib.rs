//! jtail Auth - Token gate
//!
//! Issues and verifies compact, signed, time-limited bearer tokens shared by
//! the line-protocol hub and the HTTP query surface.
//!
//! # Token Format
//!
//! ```text
//! base64url(header) . base64url(payload) . base64url(HMAC-SHA256(header.payload))
//!
//! header  = {"typ":"JWT","alg":"HS256"}
//! payload = {"exp":<epoch seconds>,"role":"admin"}
//! ```
//!
//! Tokens carry no ID and there is no revocation list: expiry is the only
//! way a token stops working. Keep TTLs short for tokens handed to guests.
//!
//! # Example
//!
//! ```
//! let token = jtail_auth::issue("s3cret", 60).unwrap();
//! assert!(jtail_auth::verify(&token, "s3cret"));
//! assert!(!jtail_auth::verify(&token, "other"));
//! ```

mod claims;
mod error;
mod gate;

/// Test utilities for minting tokens with arbitrary claims
pub mod test_utils;

pub use claims::{DEFAULT_ROLE, TokenClaims};
pub use error::{AuthError, Result};
pub use gate::{TokenGate, generate_secret, issue, issue_with_claims, verify};

/// Default TTL for operator-issued tokens (5 minutes)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 300;

/// TTL for tokens minted on the fly by CLI clients holding the secret
pub const CLIENT_TOKEN_TTL_SECS: u64 = 60;
