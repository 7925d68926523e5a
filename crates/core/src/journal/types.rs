//! Journal domain types for posting and retrieval.

use chrono::{DateTime, Utc};

use crate::store::records::{Alignment, Journal, Transaction};

/// One leg of a journal draft, before persistence.
#[derive(Debug, Clone)]
pub struct LegDraft {
    /// Client- or server-assigned transaction id.
    pub transaction_id: String,
    /// When the leg takes effect.
    pub transaction_time: DateTime<Utc>,
    /// The account this leg posts against.
    pub account_number: String,
    /// Free-form description.
    pub description: String,
    /// Debit or credit.
    pub alignment: Alignment,
    /// Amount in minor units.
    pub amount: i64,
}

/// An in-memory journal awaiting persistence.
#[derive(Debug, Clone)]
pub struct JournalDraft {
    /// Client- or server-assigned journal id.
    pub journal_id: String,
    /// When the posting happens.
    pub journaling_time: DateTime<Utc>,
    /// Free-form description.
    pub description: String,
    /// The journal this draft negates, for reversals.
    pub reversed_journal_id: Option<String>,
    /// The legs, in the order the caller wants them applied.
    pub legs: Vec<LegDraft>,
}

/// A persisted journal with its legs, and the reversed journal when this one
/// is a reversal.
#[derive(Debug, Clone)]
pub struct JournalView {
    /// The journal record.
    pub journal: Journal,
    /// The legs in insertion order.
    pub legs: Vec<Transaction>,
    /// The journal this one negates; loaded as a plain lookup relation, so
    /// its own `reversed_journal` is always `None`.
    pub reversed_journal: Option<Box<JournalView>>,
}

impl JournalView {
    /// Sum of the debit legs.
    #[must_use]
    pub fn total_debit(&self) -> i64 {
        self.legs
            .iter()
            .filter(|leg| leg.alignment == Alignment::Debit)
            .map(|leg| leg.amount)
            .sum()
    }

    /// Sum of the credit legs.
    #[must_use]
    pub fn total_credit(&self) -> i64 {
        self.legs
            .iter()
            .filter(|leg| leg.alignment == Alignment::Credit)
            .map(|leg| leg.amount)
            .sum()
    }
}

/// Lifecycle of a journal.
///
/// `Draft` and `Validating` exist only in memory; a journal becomes terminal
/// at `Persisted`. `Reversed` is a property tag set when another journal
/// references it, not a mutation of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalStatus {
    /// In-memory only, still being assembled.
    Draft,
    /// Inside the validation pipeline.
    Validating,
    /// Written to the store; immutable from here on.
    Persisted,
    /// Another persisted journal references this one as its target.
    Reversed,
}

impl JournalStatus {
    /// Whether the journal can still change.
    #[must_use]
    pub fn is_mutable(self) -> bool {
        matches!(self, Self::Draft | Self::Validating)
    }

    /// Whether the journal has been written to the store.
    #[must_use]
    pub fn is_persisted(self) -> bool {
        matches!(self, Self::Persisted | Self::Reversed)
    }
}
