//! The persistence port.
//!
//! [`LedgerStore`] is the abstract record store the managers are built
//! against: CRUD plus the queries each manager needs, over the four record
//! kinds. [`StoreTx`] is the transactional unit used by the journal write
//! pipeline; writes issued through it become visible atomically on commit.
//!
//! Contract points every implementation must honour:
//! - column size limits (via [`records::check_column`]) on every write;
//! - audit identities stamped from the request context, truncated to the
//!   audit column width; an empty context identity fails `IdentityMissing`;
//! - cancellation observed at method entry;
//! - soft-deleted rows invisible to every read;
//! - `StoreTx::get_account_for_update` holds the row (or store) lock until
//!   the unit commits or rolls back.

pub mod memory;
pub mod records;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pacioli_shared::RequestContext;
use thiserror::Error;

use records::{audit_user, Account, Currency, Journal, Transaction};

/// Errors produced by the persistence port.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A column value exceeds the schema limit.
    #[error("column {column} is longer than {limit} characters")]
    FieldTooLong {
        /// Offending column name.
        column: &'static str,
        /// Maximum number of characters.
        limit: usize,
    },

    /// The request context carries no caller identity.
    #[error("user identification not in context")]
    IdentityMissing,

    /// The request context was cancelled before the round trip.
    #[error("request cancelled")]
    Cancelled,

    /// The backend failed.
    #[error("{0}")]
    Backend(String),
}

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Fails with [`StoreError::Cancelled`] when the context has been cancelled.
///
/// Store implementations call this on entry to every operation; this is the
/// "abort at the next port boundary" point of the cancellation contract.
pub fn ensure_active(ctx: &RequestContext) -> StoreResult<()> {
    if ctx.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    Ok(())
}

/// Returns the audit identity for the context, truncated to the audit
/// column width.
///
/// # Errors
///
/// Returns [`StoreError::IdentityMissing`] when the context user is empty.
pub fn audit_identity(ctx: &RequestContext) -> StoreResult<String> {
    if ctx.user().is_empty() {
        return Err(StoreError::IdentityMissing);
    }
    Ok(audit_user(ctx.user()))
}

/// The abstract record store behind every manager.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // -- accounts --------------------------------------------------------

    /// Inserts a new account. The account number must not be persisted yet.
    async fn insert_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()>;

    /// Updates a persisted account in place.
    async fn update_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()>;

    /// Soft-deletes an account; a no-op when absent or already deleted.
    async fn delete_account(&self, ctx: &RequestContext, account_number: &str) -> StoreResult<()>;

    /// Fetches an account by number, `None` when absent or deleted.
    async fn get_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
    ) -> StoreResult<Option<Account>>;

    /// Lists accounts sorted by name.
    async fn list_accounts(
        &self,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>>;

    /// Counts live accounts.
    async fn count_accounts(&self, ctx: &RequestContext) -> StoreResult<u64>;

    /// Lists accounts whose COA starts with `coa_prefix`, sorted by name.
    async fn list_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>>;

    /// Counts accounts whose COA starts with `coa_prefix`.
    async fn count_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
    ) -> StoreResult<u64>;

    /// Lists accounts whose name contains `name_like`, case-insensitively,
    /// sorted by name.
    async fn find_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>>;

    /// Counts accounts whose name contains `name_like`, case-insensitively.
    async fn count_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
    ) -> StoreResult<u64>;

    // -- currencies ------------------------------------------------------

    /// Inserts a new currency. The code must not be persisted yet.
    async fn insert_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()>;

    /// Updates a persisted currency in place.
    async fn update_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()>;

    /// Soft-deletes a currency; a no-op when absent or already deleted.
    async fn delete_currency(&self, ctx: &RequestContext, code: &str) -> StoreResult<()>;

    /// Fetches a currency by code, `None` when absent or deleted.
    async fn get_currency(&self, ctx: &RequestContext, code: &str)
        -> StoreResult<Option<Currency>>;

    /// Lists currencies sorted by code.
    async fn list_currencies(&self, ctx: &RequestContext) -> StoreResult<Vec<Currency>>;

    // -- journals --------------------------------------------------------

    /// Soft-deletes a journal; a no-op when absent or already deleted.
    async fn delete_journal(&self, ctx: &RequestContext, journal_id: &str) -> StoreResult<()>;

    /// Fetches a journal by id, `None` when absent or deleted.
    async fn get_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Option<Journal>>;

    /// Fetches the journal whose `reversed_journal_id` equals the given id,
    /// i.e. the reversal targeting that journal.
    async fn get_journal_by_reversal_id(
        &self,
        ctx: &RequestContext,
        reversed_journal_id: &str,
    ) -> StoreResult<Option<Journal>>;

    /// Lists journals with `journaling_time` inside the inclusive window,
    /// ascending by journaling time.
    async fn list_journals_by_time_range(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Journal>>;

    /// Counts journals with `journaling_time` inside the inclusive window.
    async fn count_journals_by_time_range(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64>;

    // -- transactions ----------------------------------------------------

    /// Soft-deletes a transaction; a no-op when absent or already deleted.
    async fn delete_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<()>;

    /// Fetches a transaction by id, `None` when absent or deleted.
    async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>>;

    /// Lists an account's transactions inside the inclusive time window,
    /// ascending by `(transaction_time, insertion order)`.
    async fn list_transactions_by_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Transaction>>;

    /// Counts an account's transactions inside the inclusive time window.
    async fn count_transactions_by_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Lists a journal's legs in insertion order.
    async fn list_transactions_by_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Vec<Transaction>>;

    // -- transactional unit ---------------------------------------------

    /// Opens a transactional unit. Writes issued through the handle are
    /// invisible until [`StoreTx::commit`] and discarded on
    /// [`StoreTx::rollback`] or drop.
    async fn begin(&self, ctx: &RequestContext) -> StoreResult<Box<dyn StoreTx>>;
}

/// A scoped transaction handle obtained from [`LedgerStore::begin`].
///
/// The journal write pipeline performs its whole read-derive-write cycle
/// through one handle, so the account balance it reads is the balance it
/// updates.
#[async_trait]
pub trait StoreTx: Send {
    /// Fetches an account and locks it for the remainder of the unit.
    async fn get_account_for_update(
        &mut self,
        account_number: &str,
    ) -> StoreResult<Option<Account>>;

    /// Inserts a journal record inside the unit.
    async fn insert_journal(&mut self, rec: &Journal) -> StoreResult<()>;

    /// Inserts a transaction record inside the unit.
    async fn insert_transaction(&mut self, rec: &Transaction) -> StoreResult<()>;

    /// Updates an account record inside the unit.
    async fn update_account(&mut self, rec: &Account) -> StoreResult<()>;

    /// Makes every write of the unit visible atomically.
    async fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards every write of the unit.
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
