pub mod app_config;
pub mod catalog_repo;
pub mod notify_repo;
pub mod order_repo;
pub mod provider_repo;
pub mod transaction_repo;

pub use app_config::Config;
pub use catalog_repo::MemoryServiceRepository;
pub use notify_repo::{MemoryActivityLogRepository, MemoryNotificationRepository};
pub use order_repo::MemoryOrderRepository;
pub use provider_repo::MemoryProviderRepository;
pub use transaction_repo::MemoryTransactionRepository;

use std::sync::Arc;

/// One handle per repository, sharing nothing. Stands where a database pool
/// would; the domain crates only ever see the repository traits.
pub struct MemoryStore {
    pub services: Arc<MemoryServiceRepository>,
    pub providers: Arc<MemoryProviderRepository>,
    pub orders: Arc<MemoryOrderRepository>,
    pub transactions: Arc<MemoryTransactionRepository>,
    pub notifications: Arc<MemoryNotificationRepository>,
    pub activity: Arc<MemoryActivityLogRepository>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            services: Arc::new(MemoryServiceRepository::new()),
            providers: Arc::new(MemoryProviderRepository::new()),
            orders: Arc::new(MemoryOrderRepository::new()),
            transactions: Arc::new(MemoryTransactionRepository::new()),
            notifications: Arc::new(MemoryNotificationRepository::new()),
            activity: Arc::new(MemoryActivityLogRepository::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
