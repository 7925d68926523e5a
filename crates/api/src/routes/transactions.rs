//! Transaction routes.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};
use tracing::error;

use pacioli_shared::RequestContext;

use super::TransactionItem;
use crate::middleware::RequestId;
use crate::response;
use crate::AppState;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions/{TransactionID}", get(get_transaction))
}

/// GET `/transactions/{TransactionID}` - fetch one leg.
async fn get_transaction(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(transaction_id): Path<String>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state
        .transactions
        .get_transaction_by_id(&ctx, &transaction_id)
        .await
    {
        Ok(leg) => response::ok("OK", TransactionItem::from(&leg)),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "get transaction failed");
            response::ledger_error(&err)
        }
    }
}
