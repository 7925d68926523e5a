//! Exchange routes: the common denominator and the rate calculator.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};
use serde::Deserialize;
use tracing::error;

use pacioli_shared::RequestContext;

use crate::middleware::RequestId;
use crate::response;
use crate::AppState;

/// Creates the exchange routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exchange/denom", get(get_denom).put(set_denom))
        .route("/exchange/{codefrom}/{codeto}", get(calculate_rate))
        .route(
            "/exchange/{codefrom}/{codeto}/{amount}",
            get(calculate_exchange),
        )
}

/// GET `/exchange/denom` - the current common denominator.
async fn get_denom(State(state): State<AppState>) -> Response {
    response::ok("OK", state.exchange.get_denom())
}

/// Query parameters for setting the denominator.
#[derive(Debug, Deserialize)]
pub struct DenomQuery {
    pub denom: Option<String>,
}

/// PUT `/exchange/denom?denom=` - replace the common denominator.
async fn set_denom(State(state): State<AppState>, Query(query): Query<DenomQuery>) -> Response {
    let Some(raw) = query.denom else {
        return response::bad_request("missing denom");
    };
    let Ok(denom) = raw.parse::<f64>() else {
        return response::bad_request("denom must be a number (could be float)");
    };
    state.exchange.set_denom(denom);
    response::ok("OK", denom)
}

/// GET `/exchange/{codefrom}/{codeto}` - the pairwise exchange rate.
async fn calculate_rate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((code_from, code_to)): Path<(String, String)>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state
        .exchange
        .calculate_exchange_rate(&ctx, &code_from, &code_to)
        .await
    {
        Ok(rate) => response::ok("OK", rate),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "calculate rate failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/exchange/{codefrom}/{codeto}/{amount}` - a converted amount,
/// truncated toward zero.
async fn calculate_exchange(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path((code_from, code_to, amount)): Path<(String, String, String)>,
) -> Response {
    let Ok(amount) = amount.parse::<i64>() else {
        return response::bad_request("amount must be a whole number");
    };
    let ctx = RequestContext::new("", request_id.0);
    match state
        .exchange
        .calculate_exchange(&ctx, &code_from, &code_to, amount)
        .await
    {
        Ok(converted) => response::ok("OK", converted),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "calculate exchange failed");
            response::ledger_error(&err)
        }
    }
}
