use ampli_catalog::OpenOrderGuard;
use ampli_core::StorageError;
use ampli_order::{OrderRepository, OrderStatus, ServiceOrder};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory order store. The guarded write is atomic under the store's write
/// lock, which is what the lifecycle compare-and-swaps rely on.
pub struct MemoryOrderRepository {
    rows: RwLock<HashMap<Uuid, ServiceOrder>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create(&self, order: &ServiceOrder) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&order.id) {
            return Err(StorageError::Conflict {
                expected: "absent".into(),
                found: "present".into(),
            });
        }
        rows.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ServiceOrder>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn update(&self, order: &ServiceOrder) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if !rows.contains_key(&order.id) {
            return Err(StorageError::NotFound(order.id.to_string()));
        }
        rows.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_guarded(
        &self,
        expected: OrderStatus,
        order: &ServiceOrder,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&order.id)
            .ok_or_else(|| StorageError::NotFound(order.id.to_string()))?;
        if current.status != expected {
            return Err(StorageError::Conflict {
                expected: expected.to_string(),
                found: current.status.to_string(),
            });
        }
        rows.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ServiceOrder>, StorageError> {
        let mut out: Vec<ServiceOrder> = self
            .rows
            .read()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_refreshable(&self) -> Result<Vec<ServiceOrder>, StorageError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|o| !o.status.is_terminal() && o.provider_order_id.is_some())
            .cloned()
            .collect())
    }

    async fn any_open_for_service(&self, service_id: Uuid) -> Result<bool, StorageError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .any(|o| o.service_id == service_id && !o.status.is_terminal()))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }

    async fn distinct_customers(&self) -> Result<usize, StorageError> {
        let rows = self.rows.read().await;
        let customers: HashSet<Uuid> = rows.values().map(|o| o.customer_id).collect();
        Ok(customers.len())
    }
}

#[async_trait]
impl OpenOrderGuard for MemoryOrderRepository {
    async fn has_open_orders(&self, service_id: Uuid) -> Result<bool, StorageError> {
        self.any_open_for_service(service_id).await
    }
}
