use ampli_core::StorageError;
use ampli_provider::{Provider, ProviderRepository, ProviderService};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory provider registry store: vendors plus their synced SKUs.
pub struct MemoryProviderRepository {
    providers: RwLock<HashMap<Uuid, Provider>>,
    services: RwLock<HashMap<Uuid, ProviderService>>,
}

impl MemoryProviderRepository {
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryProviderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderRepository for MemoryProviderRepository {
    async fn create(&self, provider: &Provider) -> Result<(), StorageError> {
        let mut providers = self.providers.write().await;
        if providers.contains_key(&provider.id) {
            return Err(StorageError::Conflict {
                expected: "absent".into(),
                found: "present".into(),
            });
        }
        providers.insert(provider.id, provider.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Provider>, StorageError> {
        Ok(self.providers.read().await.get(&id).cloned())
    }

    async fn update(&self, provider: &Provider) -> Result<(), StorageError> {
        let mut providers = self.providers.write().await;
        if !providers.contains_key(&provider.id) {
            return Err(StorageError::NotFound(provider.id.to_string()));
        }
        providers.insert(provider.id, provider.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Provider>, StorageError> {
        Ok(self.providers.read().await.values().cloned().collect())
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<ProviderService>, StorageError> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn update_service(&self, service: &ProviderService) -> Result<(), StorageError> {
        self.services
            .write()
            .await
            .insert(service.id, service.clone());
        Ok(())
    }

    async fn upsert_service(
        &self,
        service: &ProviderService,
    ) -> Result<ProviderService, StorageError> {
        let mut services = self.services.write().await;
        let existing = services
            .values()
            .find(|s| s.provider_id == service.provider_id && s.remote_id == service.remote_id)
            .cloned();
        let mut row = service.clone();
        if let Some(existing) = existing {
            // Keep identity and the admin-managed catalog link across syncs.
            row.id = existing.id;
            row.catalog_service_id = existing.catalog_service_id;
        }
        services.insert(row.id, row.clone());
        Ok(row)
    }

    async fn services_for_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderService>, StorageError> {
        Ok(self
            .services
            .read()
            .await
            .values()
            .filter(|s| s.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn deactivate_services_missing(
        &self,
        provider_id: Uuid,
        present: &[String],
    ) -> Result<usize, StorageError> {
        let mut services = self.services.write().await;
        let mut deactivated = 0;
        for service in services.values_mut() {
            if service.provider_id == provider_id
                && service.is_active
                && !present.contains(&service.remote_id)
            {
                service.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }

    async fn candidates_for_service(
        &self,
        catalog_service_id: Uuid,
    ) -> Result<Vec<ProviderService>, StorageError> {
        Ok(self
            .services
            .read()
            .await
            .values()
            .filter(|s| s.is_active && s.catalog_service_id == Some(catalog_service_id))
            .cloned()
            .collect())
    }
}
