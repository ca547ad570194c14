//! Token authentication for Axum
//!
//! `Authorized` is an extractor: a handler that takes it only runs for
//! requests carrying a valid token. Rejections are a bare 401 with no body,
//! so nothing about why a token failed leaks to the caller.
//!
//! # Setup
//!
//! Your app state must implement `HasTokenGate`:
//!
//! ```ignore
//! impl HasTokenGate for AppState {
//!     fn token_gate(&self) -> &TokenGate {
//!         &self.gate
//!     }
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::debug;

use jtail_auth::TokenGate;

/// Maximum token size (8KB) - prevents memory exhaustion attacks
const MAX_TOKEN_SIZE: usize = 8 * 1024;

/// Trait for app state that provides a token gate
pub trait HasTokenGate: Send + Sync {
    fn token_gate(&self) -> &TokenGate;
}

/// Rejection for unauthenticated requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No token in header or query
    MissingToken,
    /// Token present but not valid
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        debug!(reason = ?self, "request rejected");
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// Query parameters that may contain a token
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extract token from request with size limits
///
/// Checks in order:
/// 1. Authorization header (`Bearer <token>`)
/// 2. Query parameter (`?token=`)
///
/// Returns None if the token exceeds MAX_TOKEN_SIZE
pub fn extract_token(parts: &Parts) -> Option<String> {
    extract_from_auth_header(parts).or_else(|| extract_from_query(parts))
}

fn extract_from_auth_header(parts: &Parts) -> Option<String> {
    let auth_header = parts.headers.get(AUTHORIZATION)?;

    // "Bearer " = 7 chars
    if auth_header.len() > MAX_TOKEN_SIZE + 7 {
        return None;
    }

    let token = auth_header.to_str().ok()?.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn extract_from_query(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;

    // Limit query string parsing
    if query.len() > MAX_TOKEN_SIZE * 2 {
        return None;
    }

    let params: TokenQuery = serde_urlencoded::from_str(query).ok()?;
    params
        .token
        .filter(|t| !t.is_empty() && t.len() <= MAX_TOKEN_SIZE)
}

/// Proof that the request carried a valid token
///
/// # Example
///
/// ```ignore
/// async fn handler(_auth: Authorized, State(state): State<AppState>) -> impl IntoResponse {
///     Json(state.stats.snapshot())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

impl<S> FromRequestParts<S> for Authorized
where
    S: HasTokenGate,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(AuthRejection::MissingToken)?;

        if state.token_gate().verify(&token) {
            Ok(Authorized)
        } else {
            Err(AuthRejection::InvalidToken)
        }
    }
}
