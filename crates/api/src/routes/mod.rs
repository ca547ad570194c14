//! API routes
//!
//! Domain-grouped HTTP route handlers.

pub mod jfr;
pub mod ops;

use axum::extract::Request;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete API router
///
/// Route groups switched off in `state.routes` are not registered and answer
/// 404. Any method other than GET or OPTIONS on a known path answers 405.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        // Operations routes (health - no auth)
        .merge(ops::routes())
        .merge(jfr::routes(state.routes))
        .layer(cors)
        // Outside the CORS layer, which answers every OPTIONS itself
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Answer CORS preflight with 204 and an empty body
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_options = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;

    if is_options && response.status().is_success() {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
