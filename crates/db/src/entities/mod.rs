//! `SeaORM` entity definitions for the four ledger tables.

pub mod accounts;
pub mod currencies;
pub mod journals;
pub mod transactions;
