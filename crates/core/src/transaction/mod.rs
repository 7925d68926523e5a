//! Read-side queries and rendering over journal legs.

mod service;

pub use service::TransactionService;
