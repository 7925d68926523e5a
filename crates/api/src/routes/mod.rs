//! API route definitions.

pub mod accounts;
pub mod currencies;
pub mod exchange;
pub mod health;
pub mod journals;
pub mod transactions;

use axum::response::Response;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use pacioli_core::Transaction;
use pacioli_shared::PageRequest;

use crate::response;

/// Time format accepted in query parameters.
pub const REST_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a query time parameter, interpreted as UTC.
pub(crate) fn parse_rest_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, REST_TIME_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Query parameters shared by the windowed listing endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct WindowQuery {
    pub from: Option<String>,
    pub until: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl WindowQuery {
    /// Validates the window parameters, answering with a 400 envelope when
    /// something is missing or malformed.
    pub fn resolve(&self) -> Result<(DateTime<Utc>, DateTime<Utc>, PageRequest), Box<Response>> {
        let from = self
            .from
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Box::new(response::bad_request("missing from")))?;
        let from =
            parse_rest_time(from).ok_or_else(|| Box::new(response::bad_request("invalid from date format")))?;

        let until = self
            .until
            .as_deref()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Box::new(response::bad_request("missing until")))?;
        let until = parse_rest_time(until)
            .ok_or_else(|| Box::new(response::bad_request("invalid until date format")))?;

        let page = self
            .page
            .ok_or_else(|| Box::new(response::bad_request("missing page")))?;
        let size = self
            .size
            .ok_or_else(|| Box::new(response::bad_request("missing size")))?;

        Ok((from, until, PageRequest::new(page, size)))
    }
}

/// Wire shape of a single journal leg.
#[derive(Debug, Serialize)]
pub struct TransactionItem {
    pub transaction_id: String,
    pub transaction_time: String,
    pub account_number: String,
    pub journal_id: String,
    pub description: String,
    pub alignment: String,
    pub amount: i64,
    pub account_balance: i64,
    pub create_time: String,
    pub create_by: String,
}

impl From<&Transaction> for TransactionItem {
    fn from(leg: &Transaction) -> Self {
        Self {
            transaction_id: leg.transaction_id.clone(),
            transaction_time: leg.transaction_time.to_rfc3339(),
            account_number: leg.account_number.clone(),
            journal_id: leg.journal_id.clone(),
            description: leg.description.clone(),
            alignment: leg.alignment.as_str().to_string(),
            amount: leg.amount,
            account_balance: leg.balance,
            create_time: leg.created_at.to_rfc3339(),
            create_by: leg.created_by.clone(),
        }
    }
}
