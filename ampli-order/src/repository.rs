use crate::models::{OrderStatus, ServiceOrder};
use ampli_core::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &ServiceOrder) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<ServiceOrder>, StorageError>;

    /// Unguarded whole-row write. Reserved for a caller that already holds the
    /// order via a won status claim.
    async fn update(&self, order: &ServiceOrder) -> Result<(), StorageError>;

    /// Whole-row write conditional on the current status matching `expected`,
    /// atomic with respect to concurrent writers. This is the compare-and-swap
    /// every lifecycle transition rides on.
    async fn update_guarded(
        &self,
        expected: OrderStatus,
        order: &ServiceOrder,
    ) -> Result<(), StorageError>;

    /// A customer's orders, newest first.
    async fn list_for_customer(&self, customer_id: Uuid)
        -> Result<Vec<ServiceOrder>, StorageError>;

    /// Non-terminal orders that have been dispatched and can be polled.
    async fn list_refreshable(&self) -> Result<Vec<ServiceOrder>, StorageError>;

    /// Whether any non-terminal order references the catalog service.
    async fn any_open_for_service(&self, service_id: Uuid) -> Result<bool, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;

    /// Number of distinct customers that ever placed an order.
    async fn distinct_customers(&self) -> Result<usize, StorageError>;
}
