//! Account routes: search, creation, retrieval, and per-account activity.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use pacioli_core::account::NewAccount;
use pacioli_core::{Account, Alignment};
use pacioli_shared::{PageRequest, PageResult, RequestContext};

use super::{TransactionItem, WindowQuery};
use crate::middleware::RequestId;
use crate::response;
use crate::AppState;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(find_accounts).post(create_account))
        .route("/accounts/{AccountNumber}", get(get_account))
        .route(
            "/accounts/{AccountNumber}/transactions",
            get(list_account_transactions),
        )
        .route("/accounts/{AccountNumber}/draw", get(draw_account))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct NewAccountRequest {
    /// Account number; generated when omitted or empty.
    #[serde(default)]
    pub account_number: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub coa: String,
    pub currency: String,
    pub alignment: String,
    pub creator: String,
}

/// Wire shape of an account.
#[derive(Debug, Serialize)]
pub struct AccountEntity {
    pub account_number: String,
    pub name: String,
    pub description: String,
    pub coa: String,
    pub currency: String,
    pub alignment: String,
    pub balance: i64,
}

impl From<&Account> for AccountEntity {
    fn from(account: &Account) -> Self {
        Self {
            account_number: account.account_number.clone(),
            name: account.name.clone(),
            description: account.description.clone(),
            coa: account.coa.clone(),
            currency: account.currency_code.clone(),
            alignment: account.alignment.as_str().to_string(),
            balance: account.balance,
        }
    }
}

/// Query parameters for the account search.
#[derive(Debug, Deserialize)]
pub struct FindAccountsQuery {
    pub name: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

#[derive(Debug, Serialize)]
struct AccountListResponse {
    accounts: Vec<AccountEntity>,
    pagination: PageResult,
}

/// GET `/accounts` - find accounts by name substring, paginated.
async fn find_accounts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<FindAccountsQuery>,
) -> Response {
    let Some(name) = query.name.filter(|name| !name.is_empty()) else {
        return response::bad_request("missing name");
    };
    if name.len() < 3 {
        return response::bad_request("name query length is too short");
    }
    let Some(page) = query.page else {
        return response::bad_request("missing page");
    };
    let Some(size) = query.size else {
        return response::bad_request("missing size");
    };

    let ctx = RequestContext::new("", request_id.0);
    match state
        .accounts
        .find_accounts(&ctx, &name, PageRequest::new(page, size))
        .await
    {
        Ok((pagination, accounts)) => response::ok(
            "accounts",
            AccountListResponse {
                accounts: accounts.iter().map(AccountEntity::from).collect(),
                pagination,
            },
        ),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "account search failed");
            response::ledger_error(&err)
        }
    }
}

/// POST `/accounts` - create an account.
async fn create_account(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<NewAccountRequest>,
) -> Response {
    let ctx = RequestContext::new(body.creator.clone(), request_id.0);

    let account_number = if body.account_number.is_empty() {
        state.ids.account_number()
    } else {
        body.account_number
    };

    let new = NewAccount {
        account_number,
        name: body.name,
        description: body.description,
        coa: body.coa,
        currency_code: body.currency,
        alignment: Alignment::from_column(&body.alignment),
    };

    match state.accounts.persist_account(&ctx, new).await {
        Ok(account) => response::ok("create account", account.account_number),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "create account failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/accounts/{AccountNumber}` - fetch one account.
async fn get_account(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(account_number): Path<String>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state.accounts.get_account_by_id(&ctx, &account_number).await {
        Ok(Some(account)) => response::ok(
            format!("account {account_number}"),
            AccountEntity::from(&account),
        ),
        Ok(None) => response::fail(
            axum::http::StatusCode::NOT_FOUND,
            "account number not found",
            "ACCOUNT_NOT_FOUND",
        ),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "get account failed");
            response::ledger_error(&err)
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionListResponse {
    transactions: Vec<TransactionItem>,
    pagination: PageResult,
}

async fn load_account(
    state: &AppState,
    ctx: &RequestContext,
    account_number: &str,
) -> Result<Account, Box<Response>> {
    match state.accounts.get_account_by_id(ctx, account_number).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(Box::new(response::fail(
            axum::http::StatusCode::NOT_FOUND,
            "account not found",
            "ACCOUNT_NOT_FOUND",
        ))),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "get account failed");
            Err(Box::new(response::ledger_error(&err)))
        }
    }
}

/// GET `/accounts/{AccountNumber}/transactions` - list legs in a window.
async fn list_account_transactions(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(account_number): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Response {
    let (from, until, page) = match query.resolve() {
        Ok(window) => window,
        Err(rejection) => return *rejection,
    };
    let ctx = RequestContext::new("", request_id.0);
    let account = match load_account(&state, &ctx, &account_number).await {
        Ok(account) => account,
        Err(rejection) => return *rejection,
    };

    match state
        .transactions
        .list_transactions_on_account(&ctx, from, until, &account, page)
        .await
    {
        Ok((pagination, legs)) => response::ok(
            "transaction list",
            TransactionListResponse {
                transactions: legs.iter().map(TransactionItem::from).collect(),
                pagination,
            },
        ),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "list transactions failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/accounts/{AccountNumber}/draw` - plain-text account activity.
async fn draw_account(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(account_number): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Response {
    let (from, until, page) = match query.resolve() {
        Ok(window) => window,
        Err(rejection) => return *rejection,
    };
    let ctx = RequestContext::new("", request_id.0);
    let account = match load_account(&state, &ctx, &account_number).await {
        Ok(account) => account,
        Err(rejection) => return *rejection,
    };

    match state
        .transactions
        .render_transactions_on_account(&ctx, from, until, &account, page)
        .await
    {
        Ok(drawing) => response::plain_text(drawing),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "draw account failed");
            response::ledger_error(&err)
        }
    }
}
