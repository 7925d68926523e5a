//! Journal routes: posting, listing, reversal, retrieval, and drawing.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use pacioli_core::journal::{render_journal, JournalDraft, JournalView, LegDraft};
use pacioli_core::Alignment;
use pacioli_shared::{PageResult, RequestContext};

use super::{TransactionItem, WindowQuery};
use crate::middleware::RequestId;
use crate::response;
use crate::AppState;

/// Creates the journal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journals", get(list_journals).post(create_journal))
        .route("/journals/reversal", post(create_reversal))
        .route("/journals/{JournalID}", get(get_journal))
        .route("/journals/{JournalID}/draw", get(draw_journal))
}

/// Request body for one leg of a new journal.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    pub account_number: String,
    #[serde(default)]
    pub description: String,
    pub alignment: String,
    pub amount: i64,
}

/// Request body for creating a journal.
#[derive(Debug, Deserialize)]
pub struct CreateJournalRequest {
    #[serde(default)]
    pub description: String,
    pub creator: String,
    pub transactions: Vec<TransactionRequest>,
}

/// Request body for reversing a journal.
#[derive(Debug, Deserialize)]
pub struct CreateReversalRequest {
    #[serde(default)]
    pub description: String,
    pub journal_id: String,
    pub creator: String,
}

/// Wire shape of a journal with its legs.
#[derive(Debug, Serialize)]
pub struct JournalDetail {
    pub journal_id: String,
    pub journaling_time: String,
    pub description: String,
    pub reversal: bool,
    pub reversed_journal: String,
    pub amount: i64,
    pub transactions: Vec<TransactionItem>,
    pub create_time: String,
    pub create_by: String,
}

impl From<&JournalView> for JournalDetail {
    fn from(view: &JournalView) -> Self {
        Self {
            journal_id: view.journal.journal_id.clone(),
            journaling_time: view.journal.journaling_time.to_rfc3339(),
            description: view.journal.description.clone(),
            reversal: view.journal.is_reversal,
            reversed_journal: view
                .reversed_journal
                .as_ref()
                .map(|target| target.journal.journal_id.clone())
                .unwrap_or_default(),
            amount: view.journal.total_amount,
            transactions: view.legs.iter().map(TransactionItem::from).collect(),
            create_time: view.journal.created_at.to_rfc3339(),
            create_by: view.journal.created_by.clone(),
        }
    }
}

/// POST `/journals` - validate and post a journal.
async fn create_journal(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<CreateJournalRequest>,
) -> Response {
    let ctx = RequestContext::new(body.creator.clone(), request_id.0);

    let now = Utc::now();
    let draft = JournalDraft {
        journal_id: state.ids.unique_id(),
        journaling_time: now,
        description: body.description,
        reversed_journal_id: None,
        legs: body
            .transactions
            .into_iter()
            .map(|leg| LegDraft {
                transaction_id: state.ids.unique_id(),
                transaction_time: now,
                account_number: leg.account_number,
                description: leg.description,
                alignment: Alignment::from_column(&leg.alignment),
                amount: leg.amount,
            })
            .collect(),
    };

    match state.journals.persist_journal(&ctx, &draft).await {
        Ok(()) => response::ok("OK", draft.journal_id),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "create journal failed");
            response::ledger_error(&err)
        }
    }
}

#[derive(Debug, Serialize)]
struct JournalListResponse {
    journals: Vec<JournalDetail>,
    pagination: PageResult,
}

/// GET `/journals` - list journals in a time window, paginated.
async fn list_journals(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<WindowQuery>,
) -> Response {
    let (from, until, page) = match query.resolve() {
        Ok(window) => window,
        Err(rejection) => return *rejection,
    };
    let ctx = RequestContext::new("", request_id.0);

    match state.journals.list_journals(&ctx, from, until, page).await {
        Ok((pagination, views)) => response::ok(
            "OK",
            JournalListResponse {
                journals: views.iter().map(JournalDetail::from).collect(),
                pagination,
            },
        ),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "list journals failed");
            response::ledger_error(&err)
        }
    }
}

/// POST `/journals/reversal` - post the reversal of a persisted journal.
async fn create_reversal(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<CreateReversalRequest>,
) -> Response {
    let ctx = RequestContext::new(body.creator.clone(), request_id.0);

    match state
        .journals
        .reverse_journal(&ctx, &body.journal_id, &body.description)
        .await
    {
        Ok(journal_id) => response::ok("OK", journal_id),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "create reversal failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/journals/{JournalID}` - fetch one journal with its legs.
async fn get_journal(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(journal_id): Path<String>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state.journals.get_journal_by_id(&ctx, &journal_id).await {
        Ok(view) => response::ok("OK", JournalDetail::from(&view)),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "get journal failed");
            response::ledger_error(&err)
        }
    }
}

/// GET `/journals/{JournalID}/draw` - plain-text journal drawing.
async fn draw_journal(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(journal_id): Path<String>,
) -> Response {
    let ctx = RequestContext::new("", request_id.0);
    match state.journals.get_journal_by_id(&ctx, &journal_id).await {
        Ok(view) => response::plain_text(render_journal(&view)),
        Err(err) => {
            error!(request_id = ctx.request_id(), error = %err, "draw journal failed");
            response::ledger_error(&err)
        }
    }
}
