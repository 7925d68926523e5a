//! HMAC edge-token middleware for protected routes.

use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::response;
use crate::AppState;

/// Validates the HMAC token carried in the `Authorization` header.
///
/// The token may be sent raw or with a `Bearer ` prefix. Requests without a
/// valid, fresh token are rejected with 401.
pub async fn hmac_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    let Some(header) = header.filter(|value| !value.is_empty()) else {
        return response::fail(
            StatusCode::UNAUTHORIZED,
            "you are not authorized",
            "UNAUTHORIZED",
        );
    };
    let token = header.strip_prefix("Bearer ").unwrap_or(header);

    if let Err(err) = state.auth.validate(token) {
        warn!(error = %err, "rejected edge token");
        return response::fail(
            StatusCode::UNAUTHORIZED,
            "you are not authorized",
            "UNAUTHORIZED",
        );
    }
    next.run(request).await
}
