//! Unique id generation for entity keys.
//!
//! All entity keys in the ledger are opaque strings. Journals and
//! transactions use the full 32-character simple UUID form; account numbers
//! are capped at 20 characters by the schema, so generated ones take a
//! 20-character prefix (80 random bits, plenty for a single ledger).

use uuid::Uuid;

/// Maximum length of a generated journal or transaction id.
pub const UNIQUE_ID_LEN: usize = 32;

/// Maximum length of a generated account number.
pub const ACCOUNT_NUMBER_LEN: usize = 20;

/// Generator for opaque string keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueIdGenerator;

impl UniqueIdGenerator {
    /// Creates a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns a fresh 32-character id for journals and transactions.
    #[must_use]
    pub fn unique_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Returns a fresh 20-character account number.
    #[must_use]
    pub fn account_number(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ACCOUNT_NUMBER_LEN);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_length() {
        let generator = UniqueIdGenerator::new();
        assert_eq!(generator.unique_id().len(), UNIQUE_ID_LEN);
    }

    #[test]
    fn test_account_number_length() {
        let generator = UniqueIdGenerator::new();
        assert_eq!(generator.account_number().len(), ACCOUNT_NUMBER_LEN);
    }

    #[test]
    fn test_ids_are_distinct() {
        let generator = UniqueIdGenerator::new();
        let a = generator.unique_id();
        let b = generator.unique_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_are_lowercase_hex() {
        let generator = UniqueIdGenerator::new();
        assert!(generator
            .unique_id()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
