//! Per-request context threaded through every core operation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Context carried by every request into the accounting core.
///
/// It names the caller (stamped into `created_by`/`updated_by` audit
/// columns), carries the request correlation id for log lines, and exposes a
/// cancellation flag that the persistence port checks before every round
/// trip.
#[derive(Debug, Clone)]
pub struct RequestContext {
    user: String,
    request_id: String,
    cancelled: Arc<AtomicBool>,
}

impl RequestContext {
    /// Creates a context for the given caller identity and correlation id.
    #[must_use]
    pub fn new(user: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            request_id: request_id.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns a copy of this context with a different caller identity.
    ///
    /// Handlers use this when the authenticated edge identity is superseded
    /// by an explicit `creator`/`author` field in the request body.
    #[must_use]
    pub fn with_user(&self, user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            request_id: self.request_id.clone(),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// The caller identity, possibly empty.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The request correlation id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Marks the request as cancelled. Clones of this context observe the
    /// flag as well.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the request has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
