use crate::models::{Provider, ProviderService};
use ampli_core::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn create(&self, provider: &Provider) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Provider>, StorageError>;

    async fn update(&self, provider: &Provider) -> Result<(), StorageError>;

    async fn list(&self) -> Result<Vec<Provider>, StorageError>;

    async fn get_service(&self, id: Uuid) -> Result<Option<ProviderService>, StorageError>;

    async fn update_service(&self, service: &ProviderService) -> Result<(), StorageError>;

    /// Upsert keyed on `(provider_id, remote_id)`. An existing row keeps its id
    /// and catalog link; rate, bounds, naming, and freshness are replaced and
    /// the row is reactivated.
    async fn upsert_service(
        &self,
        service: &ProviderService,
    ) -> Result<ProviderService, StorageError>;

    async fn services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderService>, StorageError>;

    /// Deactivate this provider's rows whose remote id is absent from
    /// `present`. Rows are never deleted; order history keeps pointing at them.
    /// Returns how many rows were deactivated.
    async fn deactivate_services_missing(
        &self,
        provider_id: Uuid,
        present: &[String],
    ) -> Result<usize, StorageError>;

    /// Active provider services linked to a catalog service.
    async fn candidates_for_service(
        &self,
        catalog_service_id: Uuid,
    ) -> Result<Vec<ProviderService>, StorageError>;
}
