//! Telemetry routes
//!
//! Read-only views over the live aggregate. All routes except `/jfr/metrics`
//! require a token.

use std::fmt::Write;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{Html, IntoResponse, Response};
use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;

use jtail_protocol::Event;
use jtail_stats::StatsSnapshot;

use crate::auth::Authorized;
use crate::error::Result;
use crate::state::{AppState, RouteOptions};
use crate::types::{Bundle, Environment};

/// Dashboard page, token read from its own query string
const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// Suggested download name for the incident bundle
pub const BUNDLE_FILENAME: &str = "jfr-bundle.json";

/// Telemetry routes, filtered by the enabled route groups
pub fn routes(options: RouteOptions) -> Router<AppState> {
    let mut router = Router::new();

    if options.stats_enabled {
        router = router
            .route("/jfr/stats", get(stats))
            .route("/jfr/metrics", get(metrics))
            .route("/jfr/history", get(history))
            .route("/jfr/bundle", get(bundle));
    }

    if options.dashboard_enabled {
        router = router.route("/jfr/dashboard", get(dashboard));
    }

    router
}

/// GET /jfr/stats
async fn stats(_auth: Authorized, State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

/// GET /jfr/history
async fn history(_auth: Authorized, State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.stats.history())
}

/// GET /jfr/metrics
///
/// One `name value` pair per line.
async fn metrics(State(state): State<AppState>) -> Response {
    let mut body = String::new();
    for (name, value) in state.stats.counters().exposition() {
        let _ = writeln!(body, "{name} {value}");
    }
    let _ = writeln!(
        body,
        "jfrtail_hub_subscribers {}",
        state.tap_point.subscriber_count()
    );

    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

/// GET /jfr/bundle
async fn bundle(_auth: Authorized, State(state): State<AppState>) -> Result<Response> {
    let snapshot = state.stats.snapshot();
    let bundle = Bundle {
        generated_at: Utc::now(),
        history: snapshot.history.clone(),
        snapshot,
        environment: Environment::capture(),
    };

    let body = serde_json::to_vec_pretty(&bundle)?;
    tracing::info!(
        events = bundle.history.len(),
        bytes = body.len(),
        "incident bundle generated"
    );

    Ok((
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{BUNDLE_FILENAME}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /jfr/dashboard
async fn dashboard(_auth: Authorized) -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
