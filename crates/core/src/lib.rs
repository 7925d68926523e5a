//! Accounting core for the pacioli bookkeeping service.
//!
//! This crate contains the ledger itself, independent of any storage backend
//! or transport:
//! - Domain records and the persistence port ([`store`])
//! - The in-memory reference store used by tests ([`store::memory`])
//! - Account lifecycle and queries ([`account`])
//! - Journal validation, posting, and reversal ([`journal`])
//! - Read-side transaction queries and rendering ([`transaction`])
//! - The currency table and exchange calculator ([`exchange`])
//!
//! Every service accepts an `Arc<dyn LedgerStore>`; the SQL-backed store
//! lives in the `pacioli-db` crate.

pub mod account;
pub mod error;
pub mod exchange;
pub mod journal;
pub mod store;
pub mod transaction;

pub use account::AccountService;
pub use error::LedgerError;
pub use exchange::ExchangeService;
pub use journal::JournalService;
pub use store::records::{Account, Alignment, Currency, Journal, Transaction};
pub use store::{LedgerStore, StoreError, StoreTx};
pub use transaction::TransactionService;
