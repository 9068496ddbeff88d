pub mod dashboard;
pub mod ledger;
pub mod models;
pub mod repository;
#[cfg(test)]
pub(crate) mod testutil;
pub mod worker;

pub use dashboard::{DashboardAggregator, DashboardStats};
pub use ledger::{DispatchPolicy, NewOrder, OrderError, OrderLedger};
pub use models::{OrderStatus, ServiceOrder};
pub use repository::OrderRepository;
pub use worker::{DispatchQueue, DispatchReceiver, DispatchWorker, StatusSweeper, SweepPolicy};
