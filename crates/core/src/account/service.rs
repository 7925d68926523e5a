//! Account manager over the persistence port.

use std::sync::Arc;

use chrono::Utc;
use pacioli_shared::{PageRequest, PageResult, RequestContext};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::store::records::{Account, Alignment};
use crate::store::LedgerStore;

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Primary key; the HTTP layer generates one when the client omits it.
    pub account_number: String,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: String,
    /// Chart-of-accounts classifier.
    pub coa: String,
    /// Currency the account is denominated in; must already exist.
    pub currency_code: String,
    /// The account's natural side.
    pub alignment: Alignment,
}

/// Input for updating an account.
///
/// `balance` is `None` in the common case: balances belong to the journal
/// pipeline, so an update without one preserves whatever is stored.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    /// Primary key of the account to update.
    pub account_number: String,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: String,
    /// Chart-of-accounts classifier.
    pub coa: String,
    /// Currency the account is denominated in.
    pub currency_code: String,
    /// The account's natural side.
    pub alignment: Alignment,
    /// Explicit balance override, minor units.
    pub balance: Option<i64>,
}

/// Account manager: lifecycle and paginated queries.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn LedgerStore>,
}

impl AccountService {
    /// Creates an account manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Creates a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// `MissingField` for empty required fields, `UserIdentityMissing` for an
    /// anonymous context, `CurrencyNotFound` for an unknown currency,
    /// `AccountAlreadyExists` for a taken number, `FieldTooLong` for oversize
    /// columns.
    pub async fn persist_account(
        &self,
        ctx: &RequestContext,
        new: NewAccount,
    ) -> LedgerResult<Account> {
        if new.account_number.is_empty() {
            return Err(LedgerError::MissingField("account_number"));
        }
        if new.name.is_empty() {
            return Err(LedgerError::MissingField("name"));
        }
        if new.description.is_empty() {
            return Err(LedgerError::MissingField("description"));
        }
        if ctx.user().is_empty() {
            return Err(LedgerError::UserIdentityMissing);
        }

        if self
            .store
            .get_currency(ctx, &new.currency_code)
            .await?
            .is_none()
        {
            warn!(
                request_id = ctx.request_id(),
                currency = %new.currency_code,
                "cannot persist account, currency does not exist"
            );
            return Err(LedgerError::CurrencyNotFound(new.currency_code));
        }

        if self
            .store
            .get_account(ctx, &new.account_number)
            .await?
            .is_some()
        {
            return Err(LedgerError::AccountAlreadyExists(new.account_number));
        }

        let now = Utc::now();
        let rec = Account {
            account_number: new.account_number,
            name: new.name,
            currency_code: new.currency_code,
            description: new.description,
            alignment: new.alignment,
            balance: 0,
            coa: new.coa,
            created_at: now,
            created_by: ctx.user().to_string(),
            updated_at: now,
            updated_by: ctx.user().to_string(),
        };
        self.store.insert_account(ctx, &rec).await?;
        debug!(
            request_id = ctx.request_id(),
            account = %rec.account_number,
            "account persisted"
        );
        self.store
            .get_account(ctx, &rec.account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(rec.account_number.clone()))
    }

    /// Updates a persisted account.
    ///
    /// # Errors
    ///
    /// Same field checks as [`persist_account`](Self::persist_account), plus
    /// `AccountNotFound` when the number is not persisted.
    pub async fn update_account(
        &self,
        ctx: &RequestContext,
        update: AccountUpdate,
    ) -> LedgerResult<Account> {
        if update.account_number.is_empty() {
            return Err(LedgerError::MissingField("account_number"));
        }
        if update.name.is_empty() {
            return Err(LedgerError::MissingField("name"));
        }
        if update.description.is_empty() {
            return Err(LedgerError::MissingField("description"));
        }
        if ctx.user().is_empty() {
            return Err(LedgerError::UserIdentityMissing);
        }

        let existing = self
            .store
            .get_account(ctx, &update.account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(update.account_number.clone()))?;

        let mut rec = existing;
        rec.name = update.name;
        rec.description = update.description;
        rec.coa = update.coa;
        rec.currency_code = update.currency_code;
        rec.alignment = update.alignment;
        if let Some(balance) = update.balance {
            rec.balance = balance;
        }
        self.store.update_account(ctx, &rec).await?;
        self.store
            .get_account(ctx, &rec.account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(rec.account_number.clone()))
    }

    /// Whether an account number is persisted.
    ///
    /// # Errors
    ///
    /// Returns backend failures only; absence is `Ok(false)`.
    pub async fn is_account_exist(&self, ctx: &RequestContext, number: &str) -> LedgerResult<bool> {
        Ok(self.store.get_account(ctx, number).await?.is_some())
    }

    /// Fetches an account; `None` when the number is not persisted
    /// (distinct from a backend failure, which is `Err`).
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn get_account_by_id(
        &self,
        ctx: &RequestContext,
        number: &str,
    ) -> LedgerResult<Option<Account>> {
        Ok(self.store.get_account(ctx, number).await?)
    }

    /// Lists all accounts, paginated and sorted by name.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn list_accounts(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> LedgerResult<(PageResult, Vec<Account>)> {
        let total = self.store.count_accounts(ctx).await?;
        let result = PageResult::for_request(page, total);
        let rows = self
            .store
            .list_accounts(ctx, result.offset, result.page_size)
            .await?;
        Ok((result, rows))
    }

    /// Lists accounts under a COA prefix, paginated.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn list_accounts_by_coa(
        &self,
        ctx: &RequestContext,
        coa: &str,
        page: PageRequest,
    ) -> LedgerResult<(PageResult, Vec<Account>)> {
        let total = self.store.count_accounts_by_coa(ctx, coa).await?;
        let result = PageResult::for_request(page, total);
        let rows = self
            .store
            .list_accounts_by_coa(ctx, coa, result.offset, result.page_size)
            .await?;
        Ok((result, rows))
    }

    /// Finds accounts whose name contains the given substring,
    /// case-insensitively, paginated.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn find_accounts(
        &self,
        ctx: &RequestContext,
        name_like: &str,
        page: PageRequest,
    ) -> LedgerResult<(PageResult, Vec<Account>)> {
        let total = self.store.count_accounts_by_name(ctx, name_like).await?;
        let result = PageResult::for_request(page, total);
        let rows = self
            .store
            .find_accounts_by_name(ctx, name_like, result.offset, result.page_size)
            .await?;
        Ok((result, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::ExchangeService;
    use crate::store::memory::MemoryStore;

    fn ctx() -> RequestContext {
        RequestContext::new("max", "test-request")
    }

    async fn service_with_gold() -> AccountService {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let exchange = ExchangeService::new(Arc::clone(&store));
        exchange
            .create_currency(&ctx(), "GOLD", "Gold Currency", 1.0)
            .await
            .unwrap();
        AccountService::new(store)
    }

    fn new_account(number: &str, name: &str) -> NewAccount {
        NewAccount {
            account_number: number.to_string(),
            name: name.to_string(),
            description: "a test account".to_string(),
            coa: "1.1".to_string(),
            currency_code: "GOLD".to_string(),
            alignment: Alignment::Debit,
        }
    }

    #[tokio::test]
    async fn test_persist_and_get() {
        let service = service_with_gold().await;
        let created = service
            .persist_account(&ctx(), new_account("A1", "gold reserve"))
            .await
            .unwrap();
        assert_eq!(created.balance, 0);

        let fetched = service.get_account_by_id(&ctx(), "A1").await.unwrap().unwrap();
        assert_eq!(fetched.name, "gold reserve");
        assert!(service.is_account_exist(&ctx(), "A1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let service = service_with_gold().await;
        let mut input = new_account("", "name");
        assert!(matches!(
            service.persist_account(&ctx(), input.clone()).await,
            Err(LedgerError::MissingField("account_number"))
        ));
        input.account_number = "A1".to_string();
        input.name = String::new();
        assert!(matches!(
            service.persist_account(&ctx(), input.clone()).await,
            Err(LedgerError::MissingField("name"))
        ));
        input.name = "name".to_string();
        input.description = String::new();
        assert!(matches!(
            service.persist_account(&ctx(), input).await,
            Err(LedgerError::MissingField("description"))
        ));
    }

    #[tokio::test]
    async fn test_unknown_currency_rejected() {
        let service = service_with_gold().await;
        let mut input = new_account("A1", "name");
        input.currency_code = "VOID".to_string();
        assert!(matches!(
            service.persist_account(&ctx(), input).await,
            Err(LedgerError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let service = service_with_gold().await;
        service
            .persist_account(&ctx(), new_account("A1", "one"))
            .await
            .unwrap();
        assert!(matches!(
            service.persist_account(&ctx(), new_account("A1", "two")).await,
            Err(LedgerError::AccountAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_context_rejected() {
        let service = service_with_gold().await;
        let anonymous = RequestContext::new("", "test-request");
        assert!(matches!(
            service
                .persist_account(&anonymous, new_account("A1", "one"))
                .await,
            Err(LedgerError::UserIdentityMissing)
        ));
    }

    #[tokio::test]
    async fn test_field_too_long_only_past_limit() {
        let service = service_with_gold().await;
        let at_limit = new_account("A1", &"n".repeat(128));
        assert!(service.persist_account(&ctx(), at_limit).await.is_ok());

        let over = new_account("A2", &"n".repeat(129));
        assert!(matches!(
            service.persist_account(&ctx(), over).await,
            Err(LedgerError::FieldTooLong {
                column: "name",
                limit: 128
            })
        ));
    }

    #[tokio::test]
    async fn test_update_preserves_balance_by_default() {
        let service = service_with_gold().await;
        service
            .persist_account(&ctx(), new_account("A1", "one"))
            .await
            .unwrap();

        let updated = service
            .update_account(
                &ctx(),
                AccountUpdate {
                    account_number: "A1".to_string(),
                    name: "renamed".to_string(),
                    description: "still a test account".to_string(),
                    coa: "1.2".to_string(),
                    currency_code: "GOLD".to_string(),
                    alignment: Alignment::Debit,
                    balance: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.balance, 0);
    }

    #[tokio::test]
    async fn test_update_requires_persisted_account() {
        let service = service_with_gold().await;
        let err = service
            .update_account(
                &ctx(),
                AccountUpdate {
                    account_number: "ghost".to_string(),
                    name: "name".to_string(),
                    description: "description".to_string(),
                    coa: String::new(),
                    currency_code: "GOLD".to_string(),
                    alignment: Alignment::Debit,
                    balance: None,
                },
            )
            .await;
        assert!(matches!(err, Err(LedgerError::AccountNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_with_explicit_balance() {
        let service = service_with_gold().await;
        service
            .persist_account(&ctx(), new_account("A1", "one"))
            .await
            .unwrap();

        let updated = service
            .update_account(
                &ctx(),
                AccountUpdate {
                    account_number: "A1".to_string(),
                    name: "one".to_string(),
                    description: "a test account".to_string(),
                    coa: "1.1".to_string(),
                    currency_code: "GOLD".to_string(),
                    alignment: Alignment::Debit,
                    balance: Some(42),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.balance, 42);
    }

    #[tokio::test]
    async fn test_list_accounts_sorted_by_name() {
        let service = service_with_gold().await;
        service
            .persist_account(&ctx(), new_account("A2", "zeta"))
            .await
            .unwrap();
        service
            .persist_account(&ctx(), new_account("A1", "alpha"))
            .await
            .unwrap();

        let (page, rows) = service
            .list_accounts(&ctx(), PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_entries, 2);
        assert_eq!(rows[0].name, "alpha");
        assert_eq!(rows[1].name, "zeta");
    }

    #[tokio::test]
    async fn test_list_accounts_by_coa_prefix() {
        let service = service_with_gold().await;
        let mut asset = new_account("A1", "cash");
        asset.coa = "1.1.1".to_string();
        let mut liability = new_account("A2", "debt");
        liability.coa = "2.1".to_string();
        service.persist_account(&ctx(), asset).await.unwrap();
        service.persist_account(&ctx(), liability).await.unwrap();

        let (page, rows) = service
            .list_accounts_by_coa(&ctx(), "1.1", PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_entries, 1);
        assert_eq!(rows[0].account_number, "A1");
    }

    #[tokio::test]
    async fn test_find_accounts_paginates() {
        let service = service_with_gold().await;
        for i in 0..5 {
            service
                .persist_account(&ctx(), new_account(&format!("A{i}"), &format!("vault {i}")))
                .await
                .unwrap();
        }
        let (page, rows) = service
            .find_accounts(&ctx(), "vault", PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total_entries, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "vault 2");
    }
}
