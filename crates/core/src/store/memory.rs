//! In-memory reference implementation of the persistence port.
//!
//! This is the backend unit and integration tests run against. A single
//! `tokio` mutex guards all four tables; a transactional unit takes the lock
//! for its whole lifetime and stages writes into a copy of the tables, so a
//! unit is serialised against every other unit and every plain read
//! (journal-scope locking, the coarse variant the posting contract allows).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pacioli_shared::RequestContext;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::records::{Account, Currency, Journal, Transaction};
use super::{audit_identity, ensure_active, LedgerStore, StoreError, StoreResult, StoreTx};

#[derive(Debug, Clone)]
struct Row<T> {
    rec: T,
    deleted: bool,
}

impl<T> Row<T> {
    fn live(rec: T) -> Self {
        Self {
            rec,
            deleted: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: BTreeMap<String, Row<Account>>,
    currencies: BTreeMap<String, Row<Currency>>,
    journals: BTreeMap<String, Row<Journal>>,
    // Vec keeps insertion order, which is the leg ordering tiebreaker.
    transactions: Vec<Row<Transaction>>,
}

/// In-memory store over four tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(rows: Vec<T>, offset: u64, limit: u64) -> Vec<T> {
    rows.into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect()
}

fn sorted_by_name(mut accounts: Vec<Account>) -> Vec<Account> {
    accounts.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.account_number.cmp(&b.account_number))
    });
    accounts
}

impl Tables {
    fn live_accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts
            .values()
            .filter(|row| !row.deleted)
            .map(|row| &row.rec)
    }

    fn journals_in_range(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Vec<Journal> {
        let mut rows: Vec<Journal> = self
            .journals
            .values()
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone())
            .filter(|j| j.journaling_time >= from && j.journaling_time <= until)
            .collect();
        rows.sort_by(|a, b| {
            a.journaling_time
                .cmp(&b.journaling_time)
                .then_with(|| a.journal_id.cmp(&b.journal_id))
        });
        rows
    }

    fn account_transactions_in_range(
        &self,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<Transaction> {
        let mut rows: Vec<(usize, Transaction)> = self
            .transactions
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.deleted)
            .filter(|(_, row)| row.rec.account_number == account_number)
            .filter(|(_, row)| {
                row.rec.transaction_time >= from && row.rec.transaction_time <= until
            })
            .map(|(seq, row)| (seq, row.rec.clone()))
            .collect();
        rows.sort_by(|(seq_a, a), (seq_b, b)| {
            a.transaction_time
                .cmp(&b.transaction_time)
                .then(seq_a.cmp(seq_b))
        });
        rows.into_iter().map(|(_, rec)| rec).collect()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn insert_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let mut tables = self.tables.lock().await;
        if tables.accounts.contains_key(&rec.account_number) {
            return Err(StoreError::Backend(format!(
                "duplicate account {}",
                rec.account_number
            )));
        }
        let now = Utc::now();
        let mut rec = rec.clone();
        rec.created_at = now;
        rec.created_by = user.clone();
        rec.updated_at = now;
        rec.updated_by = user;
        tables
            .accounts
            .insert(rec.account_number.clone(), Row::live(rec));
        Ok(())
    }

    async fn update_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.accounts.get_mut(&rec.account_number) {
            if row.deleted {
                return Ok(());
            }
            let mut rec = rec.clone();
            rec.created_at = row.rec.created_at;
            rec.created_by = row.rec.created_by.clone();
            rec.updated_at = Utc::now();
            rec.updated_by = user;
            row.rec = rec;
        }
        Ok(())
    }

    async fn delete_account(&self, ctx: &RequestContext, account_number: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.accounts.get_mut(account_number) {
            row.deleted = true;
        }
        Ok(())
    }

    async fn get_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
    ) -> StoreResult<Option<Account>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .get(account_number)
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone()))
    }

    async fn list_accounts(
        &self,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        let rows = sorted_by_name(tables.live_accounts().cloned().collect());
        Ok(page(rows, offset, limit))
    }

    async fn count_accounts(&self, ctx: &RequestContext) -> StoreResult<u64> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables.live_accounts().count() as u64)
    }

    async fn list_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        let rows = sorted_by_name(
            tables
                .live_accounts()
                .filter(|a| a.coa.starts_with(coa_prefix))
                .cloned()
                .collect(),
        );
        Ok(page(rows, offset, limit))
    }

    async fn count_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .live_accounts()
            .filter(|a| a.coa.starts_with(coa_prefix))
            .count() as u64)
    }

    async fn find_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let needle = name_like.to_lowercase();
        let tables = self.tables.lock().await;
        let rows = sorted_by_name(
            tables
                .live_accounts()
                .filter(|a| a.name.to_lowercase().contains(&needle))
                .cloned()
                .collect(),
        );
        Ok(page(rows, offset, limit))
    }

    async fn count_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        let needle = name_like.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables
            .live_accounts()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .count() as u64)
    }

    async fn insert_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let mut tables = self.tables.lock().await;
        if tables.currencies.contains_key(&rec.code) {
            return Err(StoreError::Backend(format!(
                "duplicate currency {}",
                rec.code
            )));
        }
        let now = Utc::now();
        let mut rec = rec.clone();
        rec.created_at = now;
        rec.created_by = user.clone();
        rec.updated_at = now;
        rec.updated_by = user;
        tables.currencies.insert(rec.code.clone(), Row::live(rec));
        Ok(())
    }

    async fn update_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.currencies.get_mut(&rec.code) {
            if row.deleted {
                return Ok(());
            }
            let mut rec = rec.clone();
            rec.created_at = row.rec.created_at;
            rec.created_by = row.rec.created_by.clone();
            rec.updated_at = Utc::now();
            rec.updated_by = user;
            row.rec = rec;
        }
        Ok(())
    }

    async fn delete_currency(&self, ctx: &RequestContext, code: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.currencies.get_mut(code) {
            row.deleted = true;
        }
        Ok(())
    }

    async fn get_currency(
        &self,
        ctx: &RequestContext,
        code: &str,
    ) -> StoreResult<Option<Currency>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .currencies
            .get(code)
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone()))
    }

    async fn list_currencies(&self, ctx: &RequestContext) -> StoreResult<Vec<Currency>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .currencies
            .values()
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone())
            .collect())
    }

    async fn delete_journal(&self, ctx: &RequestContext, journal_id: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables.journals.get_mut(journal_id) {
            row.deleted = true;
        }
        Ok(())
    }

    async fn get_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Option<Journal>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .journals
            .get(journal_id)
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone()))
    }

    async fn get_journal_by_reversal_id(
        &self,
        ctx: &RequestContext,
        reversed_journal_id: &str,
    ) -> StoreResult<Option<Journal>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .journals
            .values()
            .filter(|row| !row.deleted)
            .map(|row| &row.rec)
            .find(|j| j.reversed_journal_id.as_deref() == Some(reversed_journal_id))
            .cloned())
    }

    async fn list_journals_by_time_range(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Journal>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(page(tables.journals_in_range(from, until), offset, limit))
    }

    async fn count_journals_by_time_range(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables.journals_in_range(from, until).len() as u64)
    }

    async fn delete_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<()> {
        ensure_active(ctx)?;
        let mut tables = self.tables.lock().await;
        if let Some(row) = tables
            .transactions
            .iter_mut()
            .find(|row| row.rec.transaction_id == transaction_id)
        {
            row.deleted = true;
        }
        Ok(())
    }

    async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|row| !row.deleted)
            .map(|row| &row.rec)
            .find(|t| t.transaction_id == transaction_id)
            .cloned())
    }

    async fn list_transactions_by_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Transaction>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(page(
            tables.account_transactions_in_range(account_number, from, until),
            offset,
            limit,
        ))
    }

    async fn count_transactions_by_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .account_transactions_in_range(account_number, from, until)
            .len() as u64)
    }

    async fn list_transactions_by_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        ensure_active(ctx)?;
        let tables = self.tables.lock().await;
        Ok(tables
            .transactions
            .iter()
            .filter(|row| !row.deleted)
            .map(|row| &row.rec)
            .filter(|t| t.journal_id == journal_id)
            .cloned()
            .collect())
    }

    async fn begin(&self, ctx: &RequestContext) -> StoreResult<Box<dyn StoreTx>> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx {
            ctx: ctx.clone(),
            user,
            guard,
            staged,
        }))
    }
}

/// Transactional unit over the memory store.
///
/// Holds the table lock for its lifetime; writes land in `staged` and are
/// swapped in wholesale on commit. Dropping the unit releases the lock with
/// the live tables untouched, so drop equals rollback.
struct MemoryTx {
    ctx: RequestContext,
    user: String,
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn get_account_for_update(
        &mut self,
        account_number: &str,
    ) -> StoreResult<Option<Account>> {
        ensure_active(&self.ctx)?;
        Ok(self
            .staged
            .accounts
            .get(account_number)
            .filter(|row| !row.deleted)
            .map(|row| row.rec.clone()))
    }

    async fn insert_journal(&mut self, rec: &Journal) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;
        if self.staged.journals.contains_key(&rec.journal_id) {
            return Err(StoreError::Backend(format!(
                "duplicate journal {}",
                rec.journal_id
            )));
        }
        if let Some(target) = &rec.reversed_journal_id {
            let taken = self
                .staged
                .journals
                .values()
                .any(|row| row.rec.reversed_journal_id.as_deref() == Some(target));
            if taken {
                return Err(StoreError::Backend(format!(
                    "journal {target} is already reversed"
                )));
            }
        }
        let mut rec = rec.clone();
        rec.created_at = Utc::now();
        rec.created_by = self.user.clone();
        self.staged
            .journals
            .insert(rec.journal_id.clone(), Row::live(rec));
        Ok(())
    }

    async fn insert_transaction(&mut self, rec: &Transaction) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;
        if self
            .staged
            .transactions
            .iter()
            .any(|row| row.rec.transaction_id == rec.transaction_id)
        {
            return Err(StoreError::Backend(format!(
                "duplicate transaction {}",
                rec.transaction_id
            )));
        }
        let mut rec = rec.clone();
        rec.created_at = Utc::now();
        rec.created_by = self.user.clone();
        self.staged.transactions.push(Row::live(rec));
        Ok(())
    }

    async fn update_account(&mut self, rec: &Account) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;
        if let Some(row) = self.staged.accounts.get_mut(&rec.account_number) {
            if row.deleted {
                return Ok(());
            }
            let mut rec = rec.clone();
            rec.created_at = row.rec.created_at;
            rec.created_by = row.rec.created_by.clone();
            rec.updated_at = Utc::now();
            rec.updated_by = self.user.clone();
            row.rec = rec;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let Self {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
