//! jtail API
//!
//! HTTP query surface over the live aggregate. Built on Axum; every handler
//! reads a snapshot and never mutates the aggregator.
//!
//! # Usage
//!
//! ```ignore
//! use jtail_api::{build_router, AppState};
//!
//! let state = AppState::new(stats, tap_point, gate);
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! # Endpoints
//!
//! - `GET /jfr/stats` - Current snapshot (token)
//! - `GET /jfr/metrics` - Flat `name value` counters (no auth)
//! - `GET /jfr/history` - Recent events, oldest first (token)
//! - `GET /jfr/bundle` - Incident bundle download (token)
//! - `GET /jfr/dashboard` - HTML dashboard (token)
//! - `GET /health` - Liveness (no auth)
//!
//! Tokens are accepted as `Authorization: Bearer <token>` or `?token=<token>`.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod types;

// Re-exports
pub use auth::{Authorized, HasTokenGate};
pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::{AppState, RouteOptions};
pub use types::{Bundle, Environment};
