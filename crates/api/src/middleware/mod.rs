//! HTTP middleware: edge authentication and request correlation.

pub mod auth;
pub mod request_id;

pub use request_id::RequestId;
