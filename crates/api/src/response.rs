//! The uniform response envelope.
//!
//! Every JSON response is `{message, status, data, error_code}` where
//! `status` is `SUCCESS` for 2xx and `FAIL` otherwise; `data` and
//! `error_code` are omitted when empty.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use pacioli_core::LedgerError;

/// A 200 response with the given message and data payload.
pub fn ok(message: impl Into<String>, data: impl Serialize) -> Response {
    let message: String = message.into();
    (
        StatusCode::OK,
        Json(json!({
            "message": message,
            "status": "SUCCESS",
            "data": data,
        })),
    )
        .into_response()
}

/// A failure response with the given status, message, and error code.
pub fn fail(status: StatusCode, message: impl Into<String>, error_code: &str) -> Response {
    let message: String = message.into();
    (
        status,
        Json(json!({
            "message": message,
            "status": "FAIL",
            "error_code": error_code,
        })),
    )
        .into_response()
}

/// A 400 failure for a malformed request.
pub fn bad_request(message: impl Into<String>) -> Response {
    fail(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
}

/// Maps a core error onto the envelope using its status and error code.
pub fn ledger_error(err: &LedgerError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    fail(status, err.to_string(), err.error_code())
}

/// A 200 plain-text response, used by the draw endpoints.
pub fn plain_text(body: String) -> Response {
    ([("content-type", "text/plain; charset=utf-8")], body).into_response()
}
