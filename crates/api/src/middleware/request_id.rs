//! Request correlation middleware.
//!
//! Assigns every request a UUID, makes it available to handlers through a
//! request extension, and echoes it back in the `X-Request-Id` response
//! header.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// The correlation id assigned to the current request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Assigns the request id and stamps it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().simple().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}
