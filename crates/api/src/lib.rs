//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes under `/api/v1` for accounts, journals, transactions,
//!   currencies, and the exchange calculator
//! - The HMAC edge-token middleware and the request-id middleware
//! - The uniform `{message, status, data, error_code}` response envelope

pub mod middleware;
pub mod response;
pub mod routes;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pacioli_core::{
    AccountService, ExchangeService, JournalService, LedgerStore, TransactionService,
};
use pacioli_shared::{HmacAuth, UniqueIdGenerator};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account manager.
    pub accounts: Arc<AccountService>,
    /// Journal manager.
    pub journals: Arc<JournalService>,
    /// Transaction manager.
    pub transactions: Arc<TransactionService>,
    /// Currency & exchange manager.
    pub exchange: Arc<ExchangeService>,
    /// Edge-token service.
    pub auth: Arc<HmacAuth>,
    /// Generator for server-assigned entity keys.
    pub ids: UniqueIdGenerator,
    /// Magic phrase accepted by the developer key endpoint.
    pub devkey_phrase: String,
}

impl AppState {
    /// Wires all managers over one persistence port.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, auth: HmacAuth, devkey_phrase: String) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(Arc::clone(&store))),
            journals: Arc::new(JournalService::new(Arc::clone(&store))),
            transactions: Arc::new(TransactionService::new(Arc::clone(&store))),
            exchange: Arc::new(ExchangeService::new(store)),
            auth: Arc::new(auth),
            ids: UniqueIdGenerator::new(),
            devkey_phrase,
        }
    }
}

/// Creates the main application router.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::accounts::routes())
        .merge(routes::journals::routes())
        .merge(routes::transactions::routes())
        .merge(routes::currencies::routes())
        .merge(routes::exchange::routes())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::hmac_middleware,
        ));

    Router::new()
        .nest("/api/v1", protected)
        .merge(routes::health::routes())
        .layer(from_fn(middleware::request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
