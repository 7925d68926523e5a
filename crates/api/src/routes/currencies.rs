//! Currency routes: listing, retrieval, and idempotent upsert.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use pacioli_core::{Currency, LedgerError};
use pacioli_shared::RequestContext;

use crate::middleware::RequestId;
use crate::response;
use crate::AppState;

/// Creates the currency routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/currencies", get(list_currencies))
        .route("/currencies/{code}", get(get_currency).put(set_currency))
}

/// Request body for the currency upsert.
#[derive(Debug, Deserialize)]
pub struct SetCurrencyBody {
    pub name: String,
    pub exchange: f64,
    pub author: String,
}

/// Wire shape of a currency.
#[derive(Debug, Serialize)]
pub struct CurrencyEntity {
    pub code: String,
    pub name: String,
    pub exchange: f64,
}

impl From<&Currency> for CurrencyEntity {
    fn from(currency: &Currency) -> Self {
        Self {
            code: currency.code.clone(),
            name: currency.name.clone(),
            exchange: currency.exchange,
        }
    }
}

/// GET `/currencies` - list all currencies.
async fn list_currencies(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state.exchange.list_currencies(&ctx).await {
        Ok(currencies) => response::ok(
            "OK",
            currencies
                .iter()
                .map(CurrencyEntity::from)
                .collect::<Vec<_>>(),
        ),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "list currencies failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/currencies/{code}` - fetch one currency.
async fn get_currency(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state.exchange.get_currency(&ctx, &code).await {
        Ok(currency) => response::ok("OK", CurrencyEntity::from(&currency)),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "get currency failed");
            response::ledger_error(&err)
        }
    }
}

/// PUT `/currencies/{code}` - idempotent upsert: update when the code
/// exists, create otherwise.
async fn set_currency(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(code): Path<String>,
    Json(body): Json<SetCurrencyBody>,
) -> Response {
    let ctx = RequestContext::new(body.author.clone(), request_id.0);

    let result = match state.exchange.get_currency(&ctx, &code).await {
        Ok(_) => {
            state
                .exchange
                .update_currency(&ctx, &code, &body.name, body.exchange)
                .await
        }
        Err(LedgerError::CurrencyNotFound(_)) => {
            state
                .exchange
                .create_currency(&ctx, &code, &body.name, body.exchange)
                .await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(currency) => response::ok("OK", CurrencyEntity::from(&currency)),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "set currency failed");
            response::ledger_error(&err)
        }
    }
}
