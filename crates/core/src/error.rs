//! Ledger-wide error types.

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced by the accounting core.
///
/// The kinds are stable: the HTTP layer maps them to status codes and wire
/// error codes via [`status_code`](Self::status_code) and
/// [`error_code`](Self::error_code).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A required field is empty.
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    /// A column value exceeds the schema limit.
    #[error("column {column} is longer than {limit} characters")]
    FieldTooLong {
        /// Offending column name.
        column: &'static str,
        /// Maximum number of characters.
        limit: usize,
    },

    /// Two legs of one journal reference the same account.
    #[error("account {0} appears in more than one leg of the journal")]
    DuplicateLegAccount(String),

    /// Debit and credit totals differ.
    #[error("journal does not balance: debit {debit} != credit {credit}")]
    JournalNotBalance {
        /// Sum of debit legs.
        debit: i64,
        /// Sum of credit legs.
        credit: i64,
    },

    /// A leg carries a negative amount. The sign of a posting lives in the
    /// leg alignment, never in the amount.
    #[error("leg amount must not be negative, got {0}")]
    NegativeAmount(i64),

    /// Legs reference accounts with differing currencies.
    #[error("journal legs reference accounts with mixed currencies")]
    MixedCurrency,

    /// Account lookup failed.
    #[error("account {0} not found")]
    AccountNotFound(String),

    /// Currency lookup failed.
    #[error("currency {0} not found")]
    CurrencyNotFound(String),

    /// Journal lookup failed.
    #[error("journal {0} not found")]
    JournalNotFound(String),

    /// Transaction lookup failed.
    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    /// A reversal journal points at a target that cannot be loaded.
    #[error("reversed journal {0} could not be loaded")]
    JournalTargetMissing(String),

    /// Account number already taken.
    #[error("account {0} already exists")]
    AccountAlreadyExists(String),

    /// Currency code already taken.
    #[error("currency {0} already exists")]
    CurrencyAlreadyExists(String),

    /// Journal id already persisted.
    #[error("journal {0} is already persisted")]
    JournalAlreadyPersisted(String),

    /// Transaction id already persisted.
    #[error("transaction {0} is already persisted")]
    TransactionAlreadyPersisted(String),

    /// The target journal is already reversed, is itself a reversal, or the
    /// reversal points at itself.
    #[error("journal {0} can not be reversed")]
    JournalCanNotDoubleReverse(String),

    /// Storage backend failure.
    #[error("storage failure: {0}")]
    StorageFailure(String),

    /// A rollback after a failed write did not complete.
    #[error("transaction rollback failed: {0}")]
    TransactionRollback(String),

    /// The request context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request context carries no caller identity.
    #[error("user identification not in context")]
    UserIdentityMissing,
}

impl LedgerError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingField(_)
            | Self::FieldTooLong { .. }
            | Self::DuplicateLegAccount(_)
            | Self::JournalNotBalance { .. }
            | Self::NegativeAmount(_)
            | Self::MixedCurrency
            | Self::UserIdentityMissing => 400,
            Self::AccountNotFound(_)
            | Self::CurrencyNotFound(_)
            | Self::JournalNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::JournalTargetMissing(_) => 404,
            Self::AccountAlreadyExists(_)
            | Self::CurrencyAlreadyExists(_)
            | Self::JournalAlreadyPersisted(_)
            | Self::TransactionAlreadyPersisted(_)
            | Self::JournalCanNotDoubleReverse(_) => 409,
            Self::StorageFailure(_) | Self::TransactionRollback(_) | Self::Cancelled => 500,
        }
    }

    /// Returns the stable error code used in API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "MISSING_FIELD",
            Self::FieldTooLong { .. } => "FIELD_TOO_LONG",
            Self::DuplicateLegAccount(_) => "DUPLICATE_LEG_ACCOUNT",
            Self::JournalNotBalance { .. } => "JOURNAL_NOT_BALANCE",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::MixedCurrency => "MIXED_CURRENCY",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CurrencyNotFound(_) => "CURRENCY_NOT_FOUND",
            Self::JournalNotFound(_) => "JOURNAL_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::JournalTargetMissing(_) => "JOURNAL_TARGET_MISSING",
            Self::AccountAlreadyExists(_) => "ACCOUNT_ALREADY_EXISTS",
            Self::CurrencyAlreadyExists(_) => "CURRENCY_ALREADY_EXISTS",
            Self::JournalAlreadyPersisted(_) => "JOURNAL_ALREADY_PERSISTED",
            Self::TransactionAlreadyPersisted(_) => "TRANSACTION_ALREADY_PERSISTED",
            Self::JournalCanNotDoubleReverse(_) => "JOURNAL_CAN_NOT_DOUBLE_REVERSE",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
            Self::TransactionRollback(_) => "TRANSACTION_ROLLBACK",
            Self::Cancelled => "CANCELLED",
            Self::UserIdentityMissing => "USER_IDENTITY_MISSING",
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::FieldTooLong { column, limit } => Self::FieldTooLong { column, limit },
            StoreError::IdentityMissing => Self::UserIdentityMissing,
            StoreError::Cancelled => Self::Cancelled,
            StoreError::Backend(message) => Self::StorageFailure(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_400() {
        assert_eq!(LedgerError::MissingField("name").status_code(), 400);
        assert_eq!(
            LedgerError::JournalNotBalance {
                debit: 100,
                credit: 99
            }
            .status_code(),
            400
        );
        assert_eq!(LedgerError::MixedCurrency.status_code(), 400);
        assert_eq!(LedgerError::NegativeAmount(-500).status_code(), 400);
        assert_eq!(LedgerError::NegativeAmount(-500).error_code(), "NEGATIVE_AMOUNT");
    }

    #[test]
    fn test_reference_errors_are_404() {
        assert_eq!(LedgerError::AccountNotFound("A".into()).status_code(), 404);
        assert_eq!(LedgerError::JournalNotFound("J".into()).status_code(), 404);
    }

    #[test]
    fn test_conflict_errors_are_409() {
        assert_eq!(
            LedgerError::JournalAlreadyPersisted("J".into()).status_code(),
            409
        );
        assert_eq!(
            LedgerError::JournalCanNotDoubleReverse("J".into()).status_code(),
            409
        );
    }

    #[test]
    fn test_backend_errors_are_500() {
        assert_eq!(LedgerError::StorageFailure("db".into()).status_code(), 500);
        assert_eq!(LedgerError::Cancelled.status_code(), 500);
    }

    #[test]
    fn test_store_error_mapping() {
        let err = LedgerError::from(StoreError::FieldTooLong {
            column: "name",
            limit: 128,
        });
        assert!(matches!(err, LedgerError::FieldTooLong { limit: 128, .. }));
        assert!(matches!(
            LedgerError::from(StoreError::IdentityMissing),
            LedgerError::UserIdentityMissing
        ));
    }
}
