//! Currency table and exchange calculator.

mod service;

pub use service::ExchangeService;
