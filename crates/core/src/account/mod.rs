//! Account lifecycle and queries.

mod service;

pub use service::{AccountService, AccountUpdate, NewAccount};
