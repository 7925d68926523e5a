//! Currency & exchange manager over the persistence port.
//!
//! Each currency stores a coefficient `e(c)` relative to a process-wide
//! common denominator. The pairwise rate is `(denom / e(from)) * e(to) /
//! denom`, which reduces to `e(to) / e(from)`; the denominator is kept in
//! the expression as a scale knob for intermediate precision.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use pacioli_shared::RequestContext;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::store::records::Currency;
use crate::store::LedgerStore;

/// Currency & exchange manager.
///
/// The common denominator is process-local state, word-sized and atomic
/// (stored as f64 bits), so readers never observe a torn value. It is not
/// persisted; a restart resets it to 1.0.
pub struct ExchangeService {
    store: Arc<dyn LedgerStore>,
    denom_bits: AtomicU64,
}

impl ExchangeService {
    /// Creates an exchange manager with the denominator at 1.0.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            denom_bits: AtomicU64::new(1.0f64.to_bits()),
        }
    }

    /// The current common denominator.
    #[must_use]
    pub fn get_denom(&self) -> f64 {
        f64::from_bits(self.denom_bits.load(Ordering::SeqCst))
    }

    /// Replaces the common denominator.
    pub fn set_denom(&self, denom: f64) {
        self.denom_bits.store(denom.to_bits(), Ordering::SeqCst);
    }

    /// Fetches a currency.
    ///
    /// # Errors
    ///
    /// `CurrencyNotFound` when the code is not persisted.
    pub async fn get_currency(&self, ctx: &RequestContext, code: &str) -> LedgerResult<Currency> {
        self.store
            .get_currency(ctx, code)
            .await?
            .ok_or_else(|| LedgerError::CurrencyNotFound(code.to_string()))
    }

    /// Whether a currency code is persisted.
    ///
    /// # Errors
    ///
    /// Returns backend failures only; absence is `Ok(false)`.
    pub async fn is_currency_exist(&self, ctx: &RequestContext, code: &str) -> LedgerResult<bool> {
        Ok(self.store.get_currency(ctx, code).await?.is_some())
    }

    /// Lists all currencies.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn list_currencies(&self, ctx: &RequestContext) -> LedgerResult<Vec<Currency>> {
        Ok(self.store.list_currencies(ctx).await?)
    }

    /// Creates a currency.
    ///
    /// # Errors
    ///
    /// `CurrencyAlreadyExists` when the code is taken, `FieldTooLong` for
    /// oversize columns.
    pub async fn create_currency(
        &self,
        ctx: &RequestContext,
        code: &str,
        name: &str,
        exchange: f64,
    ) -> LedgerResult<Currency> {
        if self.store.get_currency(ctx, code).await?.is_some() {
            return Err(LedgerError::CurrencyAlreadyExists(code.to_string()));
        }
        let now = Utc::now();
        let rec = Currency {
            code: code.to_string(),
            name: name.to_string(),
            exchange,
            created_at: now,
            created_by: ctx.user().to_string(),
            updated_at: now,
            updated_by: ctx.user().to_string(),
        };
        self.store.insert_currency(ctx, &rec).await?;
        debug!(request_id = ctx.request_id(), code, "currency created");
        self.get_currency(ctx, code).await
    }

    /// Updates a persisted currency's name and coefficient.
    ///
    /// # Errors
    ///
    /// `CurrencyNotFound` when the code is not persisted.
    pub async fn update_currency(
        &self,
        ctx: &RequestContext,
        code: &str,
        name: &str,
        exchange: f64,
    ) -> LedgerResult<Currency> {
        let mut rec = self.get_currency(ctx, code).await?;
        rec.name = name.to_string();
        rec.exchange = exchange;
        self.store.update_currency(ctx, &rec).await?;
        self.get_currency(ctx, code).await
    }

    /// The rate for exchanging `from` into `to`: exactly 1.0 when the codes
    /// are equal.
    ///
    /// # Errors
    ///
    /// `CurrencyNotFound` when either currency is missing.
    pub async fn calculate_exchange_rate(
        &self,
        ctx: &RequestContext,
        from: &str,
        to: &str,
    ) -> LedgerResult<f64> {
        let from = self.get_currency(ctx, from).await?;
        let to = self.get_currency(ctx, to).await?;
        if from.code == to.code {
            return Ok(1.0);
        }
        let denom = self.get_denom();
        Ok(denom / from.exchange * to.exchange / denom)
    }

    /// Converts `amount` minor units of `from` into `to`, truncating toward
    /// zero.
    ///
    /// # Errors
    ///
    /// `CurrencyNotFound` when either currency is missing.
    pub async fn calculate_exchange(
        &self,
        ctx: &RequestContext,
        from: &str,
        to: &str,
        amount: i64,
    ) -> LedgerResult<i64> {
        let rate = self.calculate_exchange_rate(ctx, from, to).await?;
        #[allow(clippy::cast_possible_truncation)]
        Ok((rate * amount as f64) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn ctx() -> RequestContext {
        RequestContext::new("max", "test-request")
    }

    async fn service() -> ExchangeService {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let service = ExchangeService::new(store);
        service
            .create_currency(&ctx(), "GOLD", "Gold Currency", 1.0)
            .await
            .unwrap();
        service
            .create_currency(&ctx(), "POINT", "Reward Point", 10.0)
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service().await;
        let gold = service.get_currency(&ctx(), "GOLD").await.unwrap();
        assert_eq!(gold.name, "Gold Currency");
        assert!((gold.exchange - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let service = service().await;
        assert!(matches!(
            service.create_currency(&ctx(), "GOLD", "Gold", 1.0).await,
            Err(LedgerError::CurrencyAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_update_missing_rejected() {
        let service = service().await;
        assert!(matches!(
            service.update_currency(&ctx(), "VOID", "Void", 2.0).await,
            Err(LedgerError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rate_pair() {
        let service = service().await;
        let up = service
            .calculate_exchange_rate(&ctx(), "GOLD", "POINT")
            .await
            .unwrap();
        let down = service
            .calculate_exchange_rate(&ctx(), "POINT", "GOLD")
            .await
            .unwrap();
        assert!((up - 10.0).abs() < 1e-9);
        assert!((down - 0.1).abs() < 1e-9);
        assert!((up * down - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_same_currency_rate_is_exactly_one() {
        let service = service().await;
        // Exact equality is part of the contract, no epsilon.
        let rate = service
            .calculate_exchange_rate(&ctx(), "GOLD", "GOLD")
            .await
            .unwrap();
        assert_eq!(rate, 1.0);
    }

    #[tokio::test]
    async fn test_exchange_amounts() {
        let service = service().await;
        assert_eq!(
            service
                .calculate_exchange(&ctx(), "GOLD", "POINT", 100)
                .await
                .unwrap(),
            1000
        );
        assert_eq!(
            service
                .calculate_exchange(&ctx(), "POINT", "GOLD", 100)
                .await
                .unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_exchange_truncates_toward_zero() {
        let service = service().await;
        service
            .create_currency(&ctx(), "ODD", "Odd Coin", 3.0)
            .await
            .unwrap();
        // 100 / 3 = 33.33..; truncation, never rounding.
        assert_eq!(
            service
                .calculate_exchange(&ctx(), "ODD", "GOLD", 100)
                .await
                .unwrap(),
            33
        );
    }

    #[tokio::test]
    async fn test_missing_currency_in_rate() {
        let service = service().await;
        assert!(matches!(
            service.calculate_exchange_rate(&ctx(), "VOID", "GOLD").await,
            Err(LedgerError::CurrencyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_denom_does_not_change_rate() {
        let service = service().await;
        let before = service
            .calculate_exchange_rate(&ctx(), "GOLD", "POINT")
            .await
            .unwrap();
        service.set_denom(100.0);
        let after = service
            .calculate_exchange_rate(&ctx(), "GOLD", "POINT")
            .await
            .unwrap();
        assert!((before - after).abs() < 1e-9);
        assert!((service.get_denom() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_denom_default_and_set() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
        let service = ExchangeService::new(store);
        assert_eq!(service.get_denom(), 1.0);
        service.set_denom(2.5);
        assert_eq!(service.get_denom(), 2.5);
    }
}
