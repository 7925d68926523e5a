//! SQL implementation of the persistence port.
//!
//! Backs [`pacioli_core::LedgerStore`] with `SeaORM` over Postgres. The
//! transactional unit wraps a database transaction; account reads inside the
//! unit use `SELECT ... FOR UPDATE`, so concurrent postings touching the
//! same account serialise at the row level.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use pacioli_core::store::records::{Account, Alignment, Currency, Journal, Transaction};
use pacioli_core::store::{audit_identity, ensure_active, StoreError, StoreResult};
use pacioli_core::{LedgerStore, StoreTx};
use pacioli_shared::RequestContext;

use crate::entities::{accounts, currencies, journals, transactions};

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

// -- record/model mapping ------------------------------------------------

fn account_from_model(m: accounts::Model) -> Account {
    Account {
        account_number: m.account_number,
        name: m.name,
        currency_code: m.currency_code,
        description: m.description,
        alignment: Alignment::from_column(&m.alignment),
        balance: m.balance,
        coa: m.coa,
        created_at: m.created_at.with_timezone(&Utc),
        created_by: m.created_by,
        updated_at: m.updated_at.with_timezone(&Utc),
        updated_by: m.updated_by,
    }
}

fn currency_from_model(m: currencies::Model) -> Currency {
    Currency {
        code: m.code,
        name: m.name,
        exchange: m.exchange,
        created_at: m.created_at.with_timezone(&Utc),
        created_by: m.created_by,
        updated_at: m.updated_at.with_timezone(&Utc),
        updated_by: m.updated_by,
    }
}

fn journal_from_model(m: journals::Model) -> Journal {
    Journal {
        journal_id: m.journal_id,
        journaling_time: m.journaling_time.with_timezone(&Utc),
        description: m.description,
        is_reversal: m.is_reversal,
        reversed_journal_id: m.reversed_journal_id,
        total_amount: m.total_amount,
        created_at: m.created_at.with_timezone(&Utc),
        created_by: m.created_by,
    }
}

fn transaction_from_model(m: transactions::Model) -> Transaction {
    Transaction {
        transaction_id: m.transaction_id,
        transaction_time: m.transaction_time.with_timezone(&Utc),
        account_number: m.account_number,
        journal_id: m.journal_id,
        description: m.description,
        alignment: Alignment::from_column(&m.alignment),
        amount: m.amount,
        balance: m.balance,
        created_at: m.created_at.with_timezone(&Utc),
        created_by: m.created_by,
    }
}

/// SQL-backed persistence port.
#[derive(Debug, Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn live_accounts() -> sea_orm::Select<accounts::Entity> {
        accounts::Entity::find().filter(accounts::Column::IsDeleted.eq(false))
    }

    fn live_currencies() -> sea_orm::Select<currencies::Entity> {
        currencies::Entity::find().filter(currencies::Column::IsDeleted.eq(false))
    }

    fn live_journals() -> sea_orm::Select<journals::Entity> {
        journals::Entity::find().filter(journals::Column::IsDeleted.eq(false))
    }

    fn live_transactions() -> sea_orm::Select<transactions::Entity> {
        transactions::Entity::find().filter(transactions::Column::IsDeleted.eq(false))
    }

    fn name_filter(name_like: &str) -> sea_orm::sea_query::SimpleExpr {
        Expr::col((accounts::Entity, accounts::Column::Name)).ilike(format!("%{name_like}%"))
    }
}

#[async_trait]
impl LedgerStore for SqlStore {
    async fn insert_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let now = Utc::now();
        let model = accounts::ActiveModel {
            account_number: Set(rec.account_number.clone()),
            name: Set(rec.name.clone()),
            currency_code: Set(rec.currency_code.clone()),
            description: Set(rec.description.clone()),
            alignment: Set(rec.alignment.as_str().to_string()),
            balance: Set(rec.balance),
            coa: Set(rec.coa.clone()),
            created_at: Set(now.into()),
            created_by: Set(user.clone()),
            updated_at: Set(now.into()),
            updated_by: Set(user),
            is_deleted: Set(false),
        };
        model.insert(&self.db).await.map_err(backend)?;
        Ok(())
    }

    async fn update_account(&self, ctx: &RequestContext, rec: &Account) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let Some(existing) = Self::live_accounts()
            .filter(accounts::Column::AccountNumber.eq(&rec.account_number))
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(());
        };

        let mut active: accounts::ActiveModel = existing.into();
        active.name = Set(rec.name.clone());
        active.currency_code = Set(rec.currency_code.clone());
        active.description = Set(rec.description.clone());
        active.alignment = Set(rec.alignment.as_str().to_string());
        active.balance = Set(rec.balance);
        active.coa = Set(rec.coa.clone());
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(user);
        active.update(&self.db).await.map_err(backend)?;
        Ok(())
    }

    async fn delete_account(&self, ctx: &RequestContext, account_number: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        accounts::Entity::update_many()
            .col_expr(accounts::Column::IsDeleted, Expr::value(true))
            .filter(accounts::Column::AccountNumber.eq(account_number))
            .filter(accounts::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
    ) -> StoreResult<Option<Account>> {
        ensure_active(ctx)?;
        let model = Self::live_accounts()
            .filter(accounts::Column::AccountNumber.eq(account_number))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(account_from_model))
    }

    async fn list_accounts(
        &self,
        ctx: &RequestContext,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let rows = Self::live_accounts()
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::AccountNumber)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(account_from_model).collect())
    }

    async fn count_accounts(&self, ctx: &RequestContext) -> StoreResult<u64> {
        ensure_active(ctx)?;
        Self::live_accounts().count(&self.db).await.map_err(backend)
    }

    async fn list_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let rows = Self::live_accounts()
            .filter(accounts::Column::Coa.starts_with(coa_prefix))
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::AccountNumber)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(account_from_model).collect())
    }

    async fn count_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa_prefix: &str,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        Self::live_accounts()
            .filter(accounts::Column::Coa.starts_with(coa_prefix))
            .count(&self.db)
            .await
            .map_err(backend)
    }

    async fn find_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Account>> {
        ensure_active(ctx)?;
        let rows = Self::live_accounts()
            .filter(Self::name_filter(name_like))
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::AccountNumber)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(account_from_model).collect())
    }

    async fn count_accounts_by_name(
        &self,
        ctx: &RequestContext,
        name_like: &str,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        Self::live_accounts()
            .filter(Self::name_filter(name_like))
            .count(&self.db)
            .await
            .map_err(backend)
    }

    async fn insert_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let now = Utc::now();
        let model = currencies::ActiveModel {
            code: Set(rec.code.clone()),
            name: Set(rec.name.clone()),
            exchange: Set(rec.exchange),
            created_at: Set(now.into()),
            created_by: Set(user.clone()),
            updated_at: Set(now.into()),
            updated_by: Set(user),
            is_deleted: Set(false),
        };
        model.insert(&self.db).await.map_err(backend)?;
        Ok(())
    }

    async fn update_currency(&self, ctx: &RequestContext, rec: &Currency) -> StoreResult<()> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        rec.check_columns()?;

        let Some(existing) = Self::live_currencies()
            .filter(currencies::Column::Code.eq(&rec.code))
            .one(&self.db)
            .await
            .map_err(backend)?
        else {
            return Ok(());
        };

        let mut active: currencies::ActiveModel = existing.into();
        active.name = Set(rec.name.clone());
        active.exchange = Set(rec.exchange);
        active.updated_at = Set(Utc::now().into());
        active.updated_by = Set(user);
        active.update(&self.db).await.map_err(backend)?;
        Ok(())
    }

    async fn delete_currency(&self, ctx: &RequestContext, code: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        currencies::Entity::update_many()
            .col_expr(currencies::Column::IsDeleted, Expr::value(true))
            .filter(currencies::Column::Code.eq(code))
            .filter(currencies::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_currency(
        &self,
        ctx: &RequestContext,
        code: &str,
    ) -> StoreResult<Option<Currency>> {
        ensure_active(ctx)?;
        let model = Self::live_currencies()
            .filter(currencies::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(currency_from_model))
    }

    async fn list_currencies(&self, ctx: &RequestContext) -> StoreResult<Vec<Currency>> {
        ensure_active(ctx)?;
        let rows = Self::live_currencies()
            .order_by_asc(currencies::Column::Code)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(currency_from_model).collect())
    }

    async fn delete_journal(&self, ctx: &RequestContext, journal_id: &str) -> StoreResult<()> {
        ensure_active(ctx)?;
        journals::Entity::update_many()
            .col_expr(journals::Column::IsDeleted, Expr::value(true))
            .filter(journals::Column::JournalId.eq(journal_id))
            .filter(journals::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Option<Journal>> {
        ensure_active(ctx)?;
        let model = Self::live_journals()
            .filter(journals::Column::JournalId.eq(journal_id))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(journal_from_model))
    }

    async fn get_journal_by_reversal_id(
        &self,
        ctx: &RequestContext,
        reversed_journal_id: &str,
    ) -> StoreResult<Option<Journal>> {
        ensure_active(ctx)?;
        let model = Self::live_journals()
            .filter(journals::Column::ReversedJournalId.eq(reversed_journal_id))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(journal_from_model))
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
        let rows = Self::live_journals()
            .filter(journals::Column::JournalingTime.gte(from))
            .filter(journals::Column::JournalingTime.lte(until))
            .order_by_asc(journals::Column::JournalingTime)
            .order_by_asc(journals::Column::JournalId)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(journal_from_model).collect())
    }

    async fn count_journals_by_time_range(
        &self,
        ctx: &RequestContext,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        Self::live_journals()
            .filter(journals::Column::JournalingTime.gte(from))
            .filter(journals::Column::JournalingTime.lte(until))
            .count(&self.db)
            .await
            .map_err(backend)
    }

    async fn delete_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<()> {
        ensure_active(ctx)?;
        transactions::Entity::update_many()
            .col_expr(transactions::Column::IsDeleted, Expr::value(true))
            .filter(transactions::Column::TransactionId.eq(transaction_id))
            .filter(transactions::Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_transaction(
        &self,
        ctx: &RequestContext,
        transaction_id: &str,
    ) -> StoreResult<Option<Transaction>> {
        ensure_active(ctx)?;
        let model = Self::live_transactions()
            .filter(transactions::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(transaction_from_model))
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
        let rows = Self::live_transactions()
            .filter(transactions::Column::AccountNumber.eq(account_number))
            .filter(transactions::Column::TransactionTime.gte(from))
            .filter(transactions::Column::TransactionTime.lte(until))
            .order_by_asc(transactions::Column::TransactionTime)
            .order_by_asc(transactions::Column::Seq)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(transaction_from_model).collect())
    }

    async fn count_transactions_by_account(
        &self,
        ctx: &RequestContext,
        account_number: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<u64> {
        ensure_active(ctx)?;
        Self::live_transactions()
            .filter(transactions::Column::AccountNumber.eq(account_number))
            .filter(transactions::Column::TransactionTime.gte(from))
            .filter(transactions::Column::TransactionTime.lte(until))
            .count(&self.db)
            .await
            .map_err(backend)
    }

    async fn list_transactions_by_journal(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        ensure_active(ctx)?;
        let rows = Self::live_transactions()
            .filter(transactions::Column::JournalId.eq(journal_id))
            .order_by_asc(transactions::Column::Seq)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(transaction_from_model).collect())
    }

    async fn begin(&self, ctx: &RequestContext) -> StoreResult<Box<dyn StoreTx>> {
        ensure_active(ctx)?;
        let user = audit_identity(ctx)?;
        let txn = self.db.begin().await.map_err(backend)?;
        Ok(Box::new(SqlStoreTx {
            ctx: ctx.clone(),
            user,
            txn,
        }))
    }
}

/// Transactional unit over a database transaction.
struct SqlStoreTx {
    ctx: RequestContext,
    user: String,
    txn: DatabaseTransaction,
}

#[async_trait]
impl StoreTx for SqlStoreTx {
    async fn get_account_for_update(
        &mut self,
        account_number: &str,
    ) -> StoreResult<Option<Account>> {
        ensure_active(&self.ctx)?;
        let model = accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(account_number))
            .filter(accounts::Column::IsDeleted.eq(false))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(backend)?;
        Ok(model.map(account_from_model))
    }

    async fn insert_journal(&mut self, rec: &Journal) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;

        let model = journals::ActiveModel {
            journal_id: Set(rec.journal_id.clone()),
            journaling_time: Set(rec.journaling_time.into()),
            description: Set(rec.description.clone()),
            is_reversal: Set(rec.is_reversal),
            reversed_journal_id: Set(rec.reversed_journal_id.clone()),
            total_amount: Set(rec.total_amount),
            created_at: Set(Utc::now().into()),
            created_by: Set(self.user.clone()),
            is_deleted: Set(false),
        };
        model.insert(&self.txn).await.map_err(backend)?;
        Ok(())
    }

    async fn insert_transaction(&mut self, rec: &Transaction) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;

        let model = transactions::ActiveModel {
            transaction_id: Set(rec.transaction_id.clone()),
            transaction_time: Set(rec.transaction_time.into()),
            account_number: Set(rec.account_number.clone()),
            journal_id: Set(rec.journal_id.clone()),
            description: Set(rec.description.clone()),
            alignment: Set(rec.alignment.as_str().to_string()),
            amount: Set(rec.amount),
            balance: Set(rec.balance),
            created_at: Set(Utc::now().into()),
            created_by: Set(self.user.clone()),
            is_deleted: Set(false),
            seq: NotSet,
        };
        model.insert(&self.txn).await.map_err(backend)?;
        Ok(())
    }

    async fn update_account(&mut self, rec: &Account) -> StoreResult<()> {
        ensure_active(&self.ctx)?;
        rec.check_columns()?;

        let model = accounts::ActiveModel {
            account_number: Set(rec.account_number.clone()),
            name: Set(rec.name.clone()),
            currency_code: Set(rec.currency_code.clone()),
            description: Set(rec.description.clone()),
            alignment: Set(rec.alignment.as_str().to_string()),
            balance: Set(rec.balance),
            coa: Set(rec.coa.clone()),
            created_at: Set(rec.created_at.into()),
            created_by: Set(rec.created_by.clone()),
            updated_at: Set(Utc::now().into()),
            updated_by: Set(self.user.clone()),
            is_deleted: NotSet,
        };
        model.update(&self.txn).await.map_err(backend)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.txn.commit().await.map_err(backend)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.txn.rollback().await.map_err(backend)
    }
}
