use crate::service::Service;
use ampli_core::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    async fn create(&self, service: &Service) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Service>, StorageError>;

    async fn update(&self, service: &Service) -> Result<(), StorageError>;

    /// Active services, most recently created first.
    async fn list_active(&self) -> Result<Vec<Service>, StorageError>;

    async fn hard_delete(&self, id: Uuid) -> Result<(), StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;
}

/// Lets the catalog ask whether any non-terminal order still references a
/// service, without depending on the order domain.
#[async_trait]
pub trait OpenOrderGuard: Send + Sync {
    async fn has_open_orders(&self, service_id: Uuid) -> Result<bool, StorageError>;
}
