pub mod manager;
pub mod models;
pub mod repository;

pub use manager::{LedgerError, NewTransaction, TransactionLedger};
pub use models::{Transaction, TransactionStatus};
pub use repository::TransactionRepository;
