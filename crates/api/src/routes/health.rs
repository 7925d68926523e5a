//! Liveness probe and the developer token mint.
//!
//! Both live outside `/api/v1`, so the HMAC middleware never sees them.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::response;
use crate::AppState;

/// Creates the unauthenticated routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/devkey", get(devkey))
}

/// GET `/health` - liveness probe.
async fn health() -> Response {
    response::ok("OK", "healthy")
}

/// GET `/devkey` - mints a fresh edge token when the magic header carries
/// the configured phrase; anything else is a plain 404.
async fn devkey(State(state): State<AppState>, request: Request) -> Response {
    let phrase = request
        .headers()
        .get("HocusPocus")
        .and_then(|value| value.to_str().ok());

    if !state.devkey_phrase.is_empty() && phrase == Some(state.devkey_phrase.as_str()) {
        return ([("content-type", "text/plain")], state.auth.generate()).into_response();
    }
    (StatusCode::NOT_FOUND, "not found").into_response()
}
