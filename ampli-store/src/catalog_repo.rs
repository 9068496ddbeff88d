use ampli_catalog::{Service, ServiceRepository};
use ampli_core::StorageError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory catalog store.
pub struct MemoryServiceRepository {
    rows: RwLock<HashMap<Uuid, Service>>,
}

impl MemoryServiceRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryServiceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceRepository for MemoryServiceRepository {
    async fn create(&self, service: &Service) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&service.id) {
            return Err(StorageError::Conflict {
                expected: "absent".into(),
                found: "present".into(),
            });
        }
        rows.insert(service.id, service.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Service>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, service: &Service) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&service.id) {
            return Err(StorageError::NotFound(service.id.to_string()));
        }
        rows.insert(service.id, service.clone());
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Service>, StorageError> {
        let mut out: Vec<Service> = self
            .rows
            .read()
            .await
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn hard_delete(&self, id: Uuid) -> Result<(), StorageError> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }
}
