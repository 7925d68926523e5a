//! Journal manager: validation pipeline, posting, and reversal.

use std::sync::Arc;

use chrono::Utc;
use pacioli_shared::{PageRequest, PageResult, RequestContext, UniqueIdGenerator};
use tracing::{debug, error, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::store::records::{Journal, Transaction};
use crate::store::{LedgerStore, StoreTx};

use super::types::{JournalDraft, JournalView, LegDraft};
use super::validation;

/// Journal manager: validates, persists, and reverses journal entries.
#[derive(Clone)]
pub struct JournalService {
    store: Arc<dyn LedgerStore>,
    ids: UniqueIdGenerator,
}

impl JournalService {
    /// Creates a journal manager over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            ids: UniqueIdGenerator::new(),
        }
    }

    /// Validates and persists a journal draft.
    ///
    /// The validation pipeline runs in a fixed order and aborts on the first
    /// failure:
    /// 1. shape: journal id, at least one leg, caller identity;
    /// 2. the journal id is not yet persisted;
    /// 3. every leg has a transaction id and none is persisted;
    /// 4. no leg carries a negative amount;
    /// 5. debit and credit totals are equal;
    /// 6. no account appears in two legs;
    /// 7. every referenced account is persisted;
    /// 8. all referenced accounts share one currency;
    /// 9. a reversal target exists, is not itself a reversal, is not this
    ///    journal, and is not already reversed.
    ///
    /// The write pipeline then runs inside one transactional unit: insert
    /// the journal, then per leg (in caller order) fetch the account under
    /// lock, derive the running balance, insert the leg, and update the
    /// account. Any failure rolls the whole unit back.
    ///
    /// # Errors
    ///
    /// One of the validation errors above, or `StorageFailure` /
    /// `TransactionRollback` from the write pipeline.
    pub async fn persist_journal(
        &self,
        ctx: &RequestContext,
        draft: &JournalDraft,
    ) -> LedgerResult<()> {
        if draft.journal_id.is_empty() {
            return Err(LedgerError::MissingField("journal_id"));
        }
        if draft.legs.is_empty() {
            return Err(LedgerError::MissingField("transactions"));
        }
        if ctx.user().is_empty() {
            return Err(LedgerError::UserIdentityMissing);
        }

        if self
            .store
            .get_journal(ctx, &draft.journal_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::JournalAlreadyPersisted(
                draft.journal_id.clone(),
            ));
        }

        for leg in &draft.legs {
            if leg.transaction_id.is_empty() {
                return Err(LedgerError::MissingField("transaction_id"));
            }
        }
        for leg in &draft.legs {
            if self
                .store
                .get_transaction(ctx, &leg.transaction_id)
                .await?
                .is_some()
            {
                return Err(LedgerError::TransactionAlreadyPersisted(
                    leg.transaction_id.clone(),
                ));
            }
        }

        validation::check_amounts(&draft.legs)?;
        let total_amount = validation::check_balanced(&draft.legs)?;

        if let Some(account) = validation::find_duplicate_account(&draft.legs) {
            return Err(LedgerError::DuplicateLegAccount(account.to_string()));
        }

        let mut currency: Option<String> = None;
        for leg in &draft.legs {
            let account = self
                .store
                .get_account(ctx, &leg.account_number)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(leg.account_number.clone()))?;
            if let Some(code) = &currency {
                if *code != account.currency_code {
                    return Err(LedgerError::MixedCurrency);
                }
            } else {
                currency = Some(account.currency_code);
            }
        }

        if let Some(target_id) = &draft.reversed_journal_id {
            if *target_id == draft.journal_id {
                return Err(LedgerError::JournalCanNotDoubleReverse(target_id.clone()));
            }
            let target = self
                .store
                .get_journal(ctx, target_id)
                .await?
                .ok_or_else(|| LedgerError::JournalTargetMissing(target_id.clone()))?;
            if target.is_reversal {
                return Err(LedgerError::JournalCanNotDoubleReverse(target_id.clone()));
            }
            if self
                .store
                .get_journal_by_reversal_id(ctx, target_id)
                .await?
                .is_some()
            {
                return Err(LedgerError::JournalCanNotDoubleReverse(target_id.clone()));
            }
        }

        let rec = Journal {
            journal_id: draft.journal_id.clone(),
            journaling_time: draft.journaling_time,
            description: draft.description.clone(),
            is_reversal: draft.reversed_journal_id.is_some(),
            reversed_journal_id: draft.reversed_journal_id.clone(),
            total_amount,
            created_at: Utc::now(),
            created_by: ctx.user().to_string(),
        };

        let mut tx = self.store.begin(ctx).await?;
        match Self::write_unit(tx.as_mut(), &rec, &draft.legs, ctx.user()).await {
            Ok(()) => {
                tx.commit()
                    .await
                    .map_err(|e| LedgerError::StorageFailure(e.to_string()))?;
                debug!(
                    request_id = ctx.request_id(),
                    journal = %rec.journal_id,
                    total = total_amount,
                    "journal persisted"
                );
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(
                        request_id = ctx.request_id(),
                        journal = %rec.journal_id,
                        error = %rollback_err,
                        "rollback failed after write error"
                    );
                    return Err(LedgerError::TransactionRollback(rollback_err.to_string()));
                }
                Err(err)
            }
        }
    }

    /// The write pipeline: everything here happens inside one unit, so the
    /// balance read for each leg is the balance the update is based on.
    async fn write_unit(
        tx: &mut dyn StoreTx,
        journal: &Journal,
        legs: &[LegDraft],
        user: &str,
    ) -> LedgerResult<()> {
        tx.insert_journal(journal).await?;

        for leg in legs {
            let mut account = tx
                .get_account_for_update(&leg.account_number)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(leg.account_number.clone()))?;

            let new_balance = account.balance
                + validation::balance_delta(account.alignment, leg.alignment, leg.amount);

            let rec = Transaction {
                transaction_id: leg.transaction_id.clone(),
                transaction_time: leg.transaction_time,
                account_number: leg.account_number.clone(),
                journal_id: journal.journal_id.clone(),
                description: leg.description.clone(),
                alignment: leg.alignment,
                amount: leg.amount,
                balance: new_balance,
                created_at: Utc::now(),
                created_by: user.to_string(),
            };
            tx.insert_transaction(&rec).await?;

            account.balance = new_balance;
            account.updated_at = Utc::now();
            account.updated_by = user.to_string();
            tx.update_account(&account).await?;
        }
        Ok(())
    }

    /// Builds and persists the reversal of a persisted journal: every leg
    /// swaps alignment and keeps its amount and account. Returns the new
    /// journal id.
    ///
    /// # Errors
    ///
    /// `JournalNotFound` when the target does not exist, plus everything
    /// [`persist_journal`](Self::persist_journal) can fail with, notably
    /// `JournalCanNotDoubleReverse`.
    pub async fn reverse_journal(
        &self,
        ctx: &RequestContext,
        target_id: &str,
        description: &str,
    ) -> LedgerResult<String> {
        let target = self.get_journal_by_id(ctx, target_id).await?;

        let now = Utc::now();
        let draft = JournalDraft {
            journal_id: self.ids.unique_id(),
            journaling_time: now,
            description: description.to_string(),
            reversed_journal_id: Some(target.journal.journal_id.clone()),
            legs: target
                .legs
                .iter()
                .map(|leg| LegDraft {
                    transaction_id: self.ids.unique_id(),
                    transaction_time: now,
                    account_number: leg.account_number.clone(),
                    description: format!("{} - reversed", leg.description),
                    alignment: leg.alignment.opposite(),
                    amount: leg.amount,
                })
                .collect(),
        };
        self.persist_journal(ctx, &draft).await?;
        Ok(draft.journal_id)
    }

    /// Loads a journal with its legs in insertion order. For a reversal the
    /// target journal is populated as well; a reversal's target can never be
    /// a reversal itself, so one level of loading covers the whole chain.
    ///
    /// # Errors
    ///
    /// `JournalNotFound` for an unknown id; `JournalTargetMissing` when a
    /// reversal's target cannot be loaded.
    pub async fn get_journal_by_id(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> LedgerResult<JournalView> {
        let journal = self
            .store
            .get_journal(ctx, journal_id)
            .await?
            .ok_or_else(|| LedgerError::JournalNotFound(journal_id.to_string()))?;
        let legs = self.store.list_transactions_by_journal(ctx, journal_id).await?;

        let reversed_journal = if journal.is_reversal {
            let target_id = journal
                .reversed_journal_id
                .clone()
                .ok_or_else(|| LedgerError::JournalTargetMissing(journal_id.to_string()))?;
            let target = self
                .store
                .get_journal(ctx, &target_id)
                .await?
                .ok_or_else(|| LedgerError::JournalTargetMissing(target_id.clone()))?;
            let target_legs = self
                .store
                .list_transactions_by_journal(ctx, &target_id)
                .await?;
            Some(Box::new(JournalView {
                journal: target,
                legs: target_legs,
                reversed_journal: None,
            }))
        } else {
            None
        };

        Ok(JournalView {
            journal,
            legs,
            reversed_journal,
        })
    }

    /// Whether another journal reverses the given one.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn is_journal_reversed(
        &self,
        ctx: &RequestContext,
        journal_id: &str,
    ) -> LedgerResult<bool> {
        Ok(self
            .store
            .get_journal_by_reversal_id(ctx, journal_id)
            .await?
            .is_some())
    }

    /// Lists journals whose journaling time lies inside the inclusive
    /// window, ascending, paginated. Journals that fail to load fully are
    /// skipped with a warning rather than failing the page.
    ///
    /// # Errors
    ///
    /// Returns backend failures.
    pub async fn list_journals(
        &self,
        ctx: &RequestContext,
        from: chrono::DateTime<Utc>,
        until: chrono::DateTime<Utc>,
        page: PageRequest,
    ) -> LedgerResult<(PageResult, Vec<JournalView>)> {
        let total = self
            .store
            .count_journals_by_time_range(ctx, from, until)
            .await?;
        let result = PageResult::for_request(page, total);
        let records = self
            .store
            .list_journals_by_time_range(ctx, from, until, result.offset, result.page_size)
            .await?;

        let mut views = Vec::with_capacity(records.len());
        for record in records {
            match self.get_journal_by_id(ctx, &record.journal_id).await {
                Ok(view) => views.push(view),
                Err(err) => warn!(
                    request_id = ctx.request_id(),
                    journal = %record.journal_id,
                    error = %err,
                    "skipping journal that failed to load"
                ),
            }
        }
        Ok((result, views))
    }

    /// Second phase of a future two-phase posting protocol. Persisting
    /// commits in one unit, so there is nothing left to do here.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn commit_journal(
        &self,
        _ctx: &RequestContext,
        _draft: &JournalDraft,
    ) -> LedgerResult<()> {
        Ok(())
    }

    /// Cancellation hook of a future two-phase posting protocol. A journal
    /// that was never persisted has nothing to undo.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn cancel_journal(
        &self,
        _ctx: &RequestContext,
        _draft: &JournalDraft,
    ) -> LedgerResult<()> {
        Ok(())
    }
}
