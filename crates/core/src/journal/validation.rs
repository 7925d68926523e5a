//! Pure validation rules for journal drafts.
//!
//! These functions have no store dependency; the posting pipeline composes
//! them with the reference checks that do need the store.

use std::collections::HashSet;

use crate::error::LedgerError;
use crate::store::records::Alignment;

use super::types::LegDraft;

/// Sums the debit and credit sides of a set of legs.
#[must_use]
pub fn leg_totals(legs: &[LegDraft]) -> (i64, i64) {
    let mut debit = 0i64;
    let mut credit = 0i64;
    for leg in legs {
        match leg.alignment {
            Alignment::Debit => debit += leg.amount,
            Alignment::Credit => credit += leg.amount,
        }
    }
    (debit, credit)
}

/// Checks that no leg carries a negative amount.
///
/// Amounts live in the unsigned 64-bit range even though they are stored
/// signed; the sign of a posting is carried by the leg alignment, never by
/// the amount. Both store backends rely on this check, so they reject a
/// negative amount identically.
///
/// # Errors
///
/// Returns [`LedgerError::NegativeAmount`] naming the first offending
/// amount.
pub fn check_amounts(legs: &[LegDraft]) -> Result<(), LedgerError> {
    for leg in legs {
        if leg.amount < 0 {
            return Err(LedgerError::NegativeAmount(leg.amount));
        }
    }
    Ok(())
}

/// Checks the double-entry invariant and returns the journal total (the
/// debit sum).
///
/// # Errors
///
/// Returns [`LedgerError::JournalNotBalance`] when debit and credit totals
/// differ.
pub fn check_balanced(legs: &[LegDraft]) -> Result<i64, LedgerError> {
    let (debit, credit) = leg_totals(legs);
    if debit != credit {
        return Err(LedgerError::JournalNotBalance { debit, credit });
    }
    Ok(debit)
}

/// Returns the first account number that appears in more than one leg.
#[must_use]
pub fn find_duplicate_account(legs: &[LegDraft]) -> Option<&str> {
    let mut seen = HashSet::new();
    for leg in legs {
        if !seen.insert(leg.account_number.as_str()) {
            return Some(&leg.account_number);
        }
    }
    None
}

/// The signed balance change a leg applies to an account.
///
/// A leg on the account's natural side increases the balance, the other side
/// decreases it.
#[must_use]
pub fn balance_delta(account_alignment: Alignment, leg_alignment: Alignment, amount: i64) -> i64 {
    if account_alignment == leg_alignment {
        amount
    } else {
        -amount
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::*;

    fn leg(account: &str, alignment: Alignment, amount: i64) -> LegDraft {
        LegDraft {
            transaction_id: format!("t-{account}"),
            transaction_time: Utc::now(),
            account_number: account.to_string(),
            description: String::new(),
            alignment,
            amount,
        }
    }

    #[test]
    fn test_balanced_legs() {
        let legs = vec![
            leg("A", Alignment::Debit, 100),
            leg("B", Alignment::Credit, 100),
        ];
        assert_eq!(check_balanced(&legs).unwrap(), 100);
    }

    #[test]
    fn test_unbalanced_legs() {
        let legs = vec![
            leg("A", Alignment::Debit, 100),
            leg("B", Alignment::Credit, 99),
        ];
        assert!(matches!(
            check_balanced(&legs),
            Err(LedgerError::JournalNotBalance {
                debit: 100,
                credit: 99
            })
        ));
    }

    #[test]
    fn test_multi_leg_totals() {
        let legs = vec![
            leg("A", Alignment::Debit, 60),
            leg("B", Alignment::Debit, 40),
            leg("C", Alignment::Credit, 100),
        ];
        assert_eq!(leg_totals(&legs), (100, 100));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let legs = vec![
            leg("A", Alignment::Debit, -500),
            leg("B", Alignment::Credit, -500),
        ];
        assert!(matches!(
            check_amounts(&legs),
            Err(LedgerError::NegativeAmount(-500))
        ));
    }

    #[test]
    fn test_zero_amount_allowed() {
        let legs = vec![
            leg("A", Alignment::Debit, 0),
            leg("B", Alignment::Credit, 0),
        ];
        assert!(check_amounts(&legs).is_ok());
    }

    #[test]
    fn test_duplicate_account_detected() {
        let legs = vec![
            leg("A", Alignment::Debit, 100),
            leg("A", Alignment::Credit, 100),
        ];
        assert_eq!(find_duplicate_account(&legs), Some("A"));
    }

    #[test]
    fn test_distinct_accounts_pass() {
        let legs = vec![
            leg("A", Alignment::Debit, 100),
            leg("B", Alignment::Credit, 100),
        ];
        assert_eq!(find_duplicate_account(&legs), None);
    }

    #[test]
    fn test_balance_delta_sign() {
        assert_eq!(balance_delta(Alignment::Debit, Alignment::Debit, 50), 50);
        assert_eq!(balance_delta(Alignment::Debit, Alignment::Credit, 50), -50);
        assert_eq!(balance_delta(Alignment::Credit, Alignment::Credit, 50), 50);
        assert_eq!(balance_delta(Alignment::Credit, Alignment::Debit, 50), -50);
    }

    fn alignment_strategy() -> impl Strategy<Value = Alignment> {
        prop_oneof![Just(Alignment::Debit), Just(Alignment::Credit)]
    }

    proptest! {
        /// Swapping every leg's alignment (a reversal) keeps the journal
        /// balanced and swaps the totals.
        #[test]
        fn prop_reversal_stays_balanced(
            amounts in prop::collection::vec(0i64..1_000_000, 1..8),
        ) {
            let total: i64 = amounts.iter().sum();
            let mut legs: Vec<LegDraft> = amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| leg(&format!("D{i}"), Alignment::Debit, amount))
                .collect();
            legs.push(leg("C", Alignment::Credit, total));
            prop_assert!(check_balanced(&legs).is_ok());

            let reversed: Vec<LegDraft> = legs
                .iter()
                .map(|l| LegDraft {
                    alignment: l.alignment.opposite(),
                    ..l.clone()
                })
                .collect();
            prop_assert!(check_balanced(&reversed).is_ok());
            prop_assert_eq!(leg_totals(&reversed), (total, total));
        }

        /// A leg set passes the amount check exactly when every amount is
        /// non-negative.
        #[test]
        fn prop_amount_check_matches_sign(
            amounts in prop::collection::vec(-1_000_000i64..1_000_000, 1..8),
        ) {
            let legs: Vec<LegDraft> = amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| leg(&format!("A{i}"), Alignment::Debit, amount))
                .collect();
            let all_non_negative = amounts.iter().all(|&amount| amount >= 0);
            prop_assert_eq!(check_amounts(&legs).is_ok(), all_non_negative);
        }

        /// The delta is +amount exactly when the alignments match.
        #[test]
        fn prop_delta_matches_alignment(
            account in alignment_strategy(),
            leg_side in alignment_strategy(),
            amount in 0i64..1_000_000,
        ) {
            let delta = balance_delta(account, leg_side, amount);
            if account == leg_side {
                prop_assert_eq!(delta, amount);
            } else {
                prop_assert_eq!(delta, -amount);
            }
        }

        /// Applying a leg and then its reversal leaves any starting balance
        /// unchanged.
        #[test]
        fn prop_apply_then_reverse_is_identity(
            account in alignment_strategy(),
            leg_side in alignment_strategy(),
            amount in 0i64..1_000_000,
            start in -1_000_000i64..1_000_000,
        ) {
            let applied = start + balance_delta(account, leg_side, amount);
            let restored = applied + balance_delta(account, leg_side.opposite(), amount);
            prop_assert_eq!(restored, start);
        }
    }
}
