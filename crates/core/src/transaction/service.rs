//! Transaction manager: read-side service over journal legs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pacioli_shared::{PageRequest, PageResult, RequestContext};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::{LedgerError, LedgerResult};
use crate::store::records::{Account, Alignment, Transaction};
use crate::store::LedgerStore;

/// Transaction manager: retrieval, account listings, and rendering.
#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn LedgerStore>,
}

impl TransactionService {
    /// Creates a transaction manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Fetches a single leg.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound` when the id is not persisted.
    pub async fn get_transaction_by_id(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> LedgerResult<Transaction> {
        self.store
            .get_transaction(ctx, transaction_id)
            .await?
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Whether a transaction id is persisted.
    ///
    /// # Errors
    ///
    /// Returns backend failures only; absence is `Ok(false)`.
    pub async fn is_transaction_exist(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> LedgerResult<bool> {
        Ok(self
            .store
            .get_transaction(ctx, transaction_id)
            .await?
            .is_some())
    }

    /// Lists an account's legs inside the inclusive time window, ascending
    /// by transaction time, paginated.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn list_transactions_on_account(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        account: &Account,
        page: PageRequest,
    ) -> LedgerResult<(PageResult, Vec<Transaction>)> {
        let total = self
            .store
            .count_transactions_by_account(ctx, &account.account_number, from, until)
            .await?;
        let result = PageResult::for_request(page, total);
        let rows = self
            .store
            .list_transactions_by_account(
                ctx,
                &account.account_number,
                from,
                until,
                result.offset,
                result.page_size,
            )
            .await?;
        Ok((result, rows))
    }

    /// Renders one page of an account's activity as plain text: an account
    /// header block followed by a table with one row per leg and the running
    /// balance after each.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn render_transactions_on_account(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        account: &Account,
        page: PageRequest,
    ) -> LedgerResult<String> {
        let (result, rows) = self
            .list_transactions_on_account(ctx, from, until, account, page)
            .await?;

        let mut builder = Builder::default();
        builder.push_record([
            "TRX ID",
            "TIME",
            "JOURNAL ID",
            "DESCRIPTION",
            "DEBIT",
            "CREDIT",
            "BALANCE",
        ]);
        for leg in &rows {
            let (debit, credit) = match leg.alignment {
                Alignment::Debit => (leg.amount.to_string(), String::new()),
                Alignment::Credit => (String::new(), leg.amount.to_string()),
            };
            builder.push_record([
                leg.transaction_id.clone(),
                leg.transaction_time.to_rfc3339(),
                leg.journal_id.clone(),
                leg.description.clone(),
                debit,
                credit,
                leg.balance.to_string(),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::ascii());

        Ok(format!(
            "Account Number    : {}\n\
             Account Name      : {}\n\
             Description       : {}\n\
             Currency          : {}\n\
             COA               : {}\n\
             Current Balance   : {}\n\
             Transactions From : {}\n\
             \u{20}            To   : {}\n\
             #Transactions     : {}\n\
             Showing page      : {}/{}\n\
             {}\n",
            account.account_number,
            account.name,
            account.description,
            account.currency_code,
            account.coa,
            account.balance,
            from.to_rfc3339(),
            until.to_rfc3339(),
            result.total_entries,
            result.page,
            result.total_pages,
            table
        ))
    }
}
