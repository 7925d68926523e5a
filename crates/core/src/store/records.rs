//! Domain records stored by the persistence port.
//!
//! These are the four entities of the ledger as they exist at rest. Column
//! size limits live here because the port contract enforces them on every
//! write path, regardless of backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;

/// Column size limits shared by every store implementation.
pub mod columns {
    /// `accounts.account_number` and `transactions.account_number`.
    pub const ACCOUNT_NUMBER: usize = 20;
    /// `accounts.name`.
    pub const ACCOUNT_NAME: usize = 128;
    /// `accounts.coa`.
    pub const COA: usize = 10;
    /// `currencies.code` and `accounts.currency_code`.
    pub const CURRENCY_CODE: usize = 10;
    /// `currencies.name`.
    pub const CURRENCY_NAME: usize = 30;
    /// Every `description` column.
    pub const DESCRIPTION: usize = 255;
    /// `journals.journal_id` and `transactions.transaction_id`.
    pub const ENTITY_ID: usize = 32;
    /// `created_by` / `updated_by` audit columns.
    pub const AUDIT_USER: usize = 16;
}

/// Fails with [`StoreError::FieldTooLong`] when `value` exceeds `limit`.
pub fn check_column(column: &'static str, value: &str, limit: usize) -> Result<(), StoreError> {
    if value.chars().count() > limit {
        return Err(StoreError::FieldTooLong { column, limit });
    }
    Ok(())
}

/// Truncates a caller identity to the audit column width.
///
/// Audit fields truncate rather than error; everything else is a structural
/// `FieldTooLong`.
#[must_use]
pub fn audit_user(user: &str) -> String {
    user.chars().take(columns::AUDIT_USER).collect()
}

/// Which side of the ledger an account or leg sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Alignment {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

impl Alignment {
    /// The column value stored for this alignment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }

    /// Parses a stored column value; anything that is not `DEBIT`
    /// (case-insensitive) reads as credit, matching the historical data.
    #[must_use]
    pub fn from_column(value: &str) -> Self {
        if value.eq_ignore_ascii_case("DEBIT") {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    /// The opposite side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named container of value in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Primary key, at most 20 characters.
    pub account_number: String,
    /// Human-readable name.
    pub name: String,
    /// Currency this account is denominated in.
    pub currency_code: String,
    /// Free-form description.
    pub description: String,
    /// The account's natural side: a leg on this side increases the balance.
    pub alignment: Alignment,
    /// Current balance in minor units.
    pub balance: i64,
    /// Chart-of-accounts classifier.
    pub coa: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Creator identity (audit, at most 16 chars).
    pub created_by: String,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Last updater identity.
    pub updated_by: String,
}

impl Account {
    /// Validates column sizes against the schema limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldTooLong`] naming the first oversize column.
    pub fn check_columns(&self) -> Result<(), StoreError> {
        check_column("account_number", &self.account_number, columns::ACCOUNT_NUMBER)?;
        check_column("name", &self.name, columns::ACCOUNT_NAME)?;
        check_column("currency_code", &self.currency_code, columns::CURRENCY_CODE)?;
        check_column("description", &self.description, columns::DESCRIPTION)?;
        check_column("coa", &self.coa, columns::COA)?;
        Ok(())
    }
}

/// A currency with its exchange coefficient relative to the common
/// denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// Primary key, at most 10 characters.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Exchange coefficient.
    pub exchange: f64,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Creator identity.
    pub created_by: String,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
    /// Last updater identity.
    pub updated_by: String,
}

impl Currency {
    /// Validates column sizes against the schema limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldTooLong`] naming the first oversize column.
    pub fn check_columns(&self) -> Result<(), StoreError> {
        check_column("code", &self.code, columns::CURRENCY_CODE)?;
        check_column("name", &self.name, columns::CURRENCY_NAME)?;
        Ok(())
    }
}

/// An atomic posting of two or more balanced legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    /// Primary key, at most 32 characters.
    pub journal_id: String,
    /// When the posting happened.
    pub journaling_time: DateTime<Utc>,
    /// Free-form description.
    pub description: String,
    /// Whether this journal negates another journal.
    pub is_reversal: bool,
    /// The journal negated by this one, when `is_reversal`.
    pub reversed_journal_id: Option<String>,
    /// Sum of debit amounts, which equals the sum of credit amounts.
    pub total_amount: i64,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Creator identity.
    pub created_by: String,
}

impl Journal {
    /// Validates column sizes against the schema limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldTooLong`] naming the first oversize column.
    pub fn check_columns(&self) -> Result<(), StoreError> {
        check_column("journal_id", &self.journal_id, columns::ENTITY_ID)?;
        check_column("description", &self.description, columns::DESCRIPTION)?;
        if let Some(reversed) = &self.reversed_journal_id {
            check_column("reversed_journal_id", reversed, columns::ENTITY_ID)?;
        }
        Ok(())
    }
}

/// A single leg of a journal: one debit or credit against one account,
/// carrying the account balance after the leg was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Primary key, at most 32 characters.
    pub transaction_id: String,
    /// When the leg took effect.
    pub transaction_time: DateTime<Utc>,
    /// The account this leg posts against.
    pub account_number: String,
    /// The owning journal.
    pub journal_id: String,
    /// Free-form description.
    pub description: String,
    /// Debit or credit.
    pub alignment: Alignment,
    /// Amount in minor units, non-negative.
    pub amount: i64,
    /// Account balance after this leg.
    pub balance: i64,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Creator identity.
    pub created_by: String,
}

impl Transaction {
    /// Validates column sizes against the schema limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::FieldTooLong`] naming the first oversize column.
    pub fn check_columns(&self) -> Result<(), StoreError> {
        check_column("transaction_id", &self.transaction_id, columns::ENTITY_ID)?;
        check_column("account_number", &self.account_number, columns::ACCOUNT_NUMBER)?;
        check_column("journal_id", &self.journal_id, columns::ENTITY_ID)?;
        check_column("description", &self.description, columns::DESCRIPTION)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(number: &str, name: &str) -> Account {
        Account {
            account_number: number.to_string(),
            name: name.to_string(),
            currency_code: "GOLD".to_string(),
            description: "a test account".to_string(),
            alignment: Alignment::Debit,
            balance: 0,
            coa: "1.1".to_string(),
            created_at: Utc::now(),
            created_by: "max".to_string(),
            updated_at: Utc::now(),
            updated_by: "max".to_string(),
        }
    }

    #[test]
    fn test_limit_is_inclusive() {
        // Exactly at the limit passes; one past it fails.
        let at_limit = account(&"9".repeat(20), "reserve");
        assert!(at_limit.check_columns().is_ok());

        let over = account(&"9".repeat(21), "reserve");
        assert!(matches!(
            over.check_columns(),
            Err(StoreError::FieldTooLong {
                column: "account_number",
                limit: 20
            })
        ));
    }

    #[test]
    fn test_name_limit() {
        let over = account("1", &"n".repeat(129));
        assert!(matches!(
            over.check_columns(),
            Err(StoreError::FieldTooLong {
                column: "name",
                limit: 128
            })
        ));
    }

    #[test]
    fn test_audit_user_truncates() {
        assert_eq!(audit_user("a-very-long-user-name"), "a-very-long-user");
        assert_eq!(audit_user("max"), "max");
    }

    #[test]
    fn test_alignment_round_trip() {
        assert_eq!(Alignment::from_column("DEBIT"), Alignment::Debit);
        assert_eq!(Alignment::from_column("debit"), Alignment::Debit);
        assert_eq!(Alignment::from_column("CREDIT"), Alignment::Credit);
        assert_eq!(Alignment::Debit.opposite(), Alignment::Credit);
        assert_eq!(Alignment::Credit.opposite(), Alignment::Debit);
    }
}
