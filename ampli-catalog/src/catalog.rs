use crate::repository::{OpenOrderGuard, ServiceRepository};
use crate::service::Service;
use ampli_core::StorageError;
use ampli_notify::{ActivityRecorder, NewActivity};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("service not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub title: String,
    pub price: Decimal,
    pub features: Vec<String>,
    pub is_popular: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub features: Option<Vec<String>>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
}

/// Outcome of a remove call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Still referenced by open orders, flipped inactive instead.
    Deactivated,
    Deleted,
}

/// Admin-facing catalog operations. All writes carry the acting admin's id so
/// the audit trail does not depend on ambient session state.
pub struct CatalogService {
    services: Arc<dyn ServiceRepository>,
    orders: Arc<dyn OpenOrderGuard>,
    activity: Arc<ActivityRecorder>,
}

impl CatalogService {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        orders: Arc<dyn OpenOrderGuard>,
        activity: Arc<ActivityRecorder>,
    ) -> Self {
        Self {
            services,
            orders,
            activity,
        }
    }

    /// Active services, newest first.
    pub async fn list(&self) -> Result<Vec<Service>, CatalogError> {
        Ok(self.services.list_active().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Service, CatalogError> {
        self.services
            .get(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    pub async fn create(&self, actor: Uuid, input: NewService) -> Result<Service, CatalogError> {
        validate_title(&input.title)?;
        validate_price(input.price)?;
        validate_features(&input.features)?;

        let mut service = Service::new(input.title, input.price, input.features);
        service.is_popular = input.is_popular;
        self.services.create(&service).await?;

        self.activity
            .record(NewActivity {
                actor_id: Some(actor),
                action: "service.create".into(),
                resource: Some("service".into()),
                resource_id: Some(service.id.to_string()),
                details: Some(format!("created service '{}'", service.title)),
                ..Default::default()
            })
            .await;

        Ok(service)
    }

    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        update: ServiceUpdate,
    ) -> Result<Service, CatalogError> {
        let mut service = self.get(id).await?;

        if let Some(title) = update.title {
            validate_title(&title)?;
            service.title = title;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
            service.price = price;
        }
        if let Some(features) = update.features {
            validate_features(&features)?;
            service.features = features;
        }
        if let Some(popular) = update.is_popular {
            service.is_popular = popular;
        }
        if let Some(active) = update.is_active {
            service.is_active = active;
        }
        service.updated_at = Utc::now();
        self.services.update(&service).await?;

        self.activity
            .record(NewActivity {
                actor_id: Some(actor),
                action: "service.update".into(),
                resource: Some("service".into()),
                resource_id: Some(id.to_string()),
                ..Default::default()
            })
            .await;

        Ok(service)
    }

    /// Logical delete while any non-terminal order references the service,
    /// hard delete otherwise.
    pub async fn remove(&self, actor: Uuid, id: Uuid) -> Result<Removal, CatalogError> {
        let mut service = self.get(id).await?;

        let removal = if self.orders.has_open_orders(id).await? {
            service.is_active = false;
            service.updated_at = Utc::now();
            self.services.update(&service).await?;
            Removal::Deactivated
        } else {
            self.services.hard_delete(id).await?;
            Removal::Deleted
        };

        self.activity
            .record(NewActivity {
                actor_id: Some(actor),
                action: "service.remove".into(),
                resource: Some("service".into()),
                resource_id: Some(id.to_string()),
                details: Some(format!("{:?}", removal)),
                ..Default::default()
            })
            .await;

        Ok(removal)
    }
}

fn validate_title(title: &str) -> Result<(), CatalogError> {
    if title.trim().is_empty() {
        return Err(CatalogError::Validation("title must not be empty".into()));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), CatalogError> {
    if price <= Decimal::ZERO {
        return Err(CatalogError::Validation("price must be positive".into()));
    }
    Ok(())
}

fn validate_features(features: &[String]) -> Result<(), CatalogError> {
    if features.is_empty() || features.iter().all(|f| f.trim().is_empty()) {
        return Err(CatalogError::Validation(
            "at least one feature is required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ampli_notify::{ActivityLog, ActivityLogRepository};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct TestServices {
        rows: RwLock<HashMap<Uuid, Service>>,
    }

    #[async_trait]
    impl ServiceRepository for TestServices {
        async fn create(&self, service: &Service) -> Result<(), StorageError> {
            self.rows.write().await.insert(service.id, service.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> Result<Option<Service>, StorageError> {
            Ok(self.rows.read().await.get(&id).cloned())
        }

        async fn update(&self, service: &Service) -> Result<(), StorageError> {
            self.rows.write().await.insert(service.id, service.clone());
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
            self.rows.write().await.remove(&id);
            Ok(())
        }

        async fn count(&self) -> Result<usize, StorageError> {
            Ok(self.rows.read().await.len())
        }
    }

    struct FixedGuard(bool);

    #[async_trait]
    impl OpenOrderGuard for FixedGuard {
        async fn has_open_orders(&self, _service_id: Uuid) -> Result<bool, StorageError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct NullActivity;

    #[async_trait]
    impl ActivityLogRepository for NullActivity {
        async fn append(&self, _entry: &ActivityLog) -> Result<(), StorageError> {
            Ok(())
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<ActivityLog>, StorageError> {
            Ok(vec![])
        }
    }

    fn catalog(open_orders: bool) -> (CatalogService, Arc<TestServices>) {
        let services = Arc::new(TestServices::default());
        let catalog = CatalogService::new(
            services.clone(),
            Arc::new(FixedGuard(open_orders)),
            Arc::new(ActivityRecorder::new(Arc::new(NullActivity))),
        );
        (catalog, services)
    }

    fn valid_input() -> NewService {
        NewService {
            title: "Instagram Followers".into(),
            price: dec!(0.015),
            features: vec!["Real accounts".into(), "Gradual delivery".into()],
            is_popular: false,
        }
    }

    #[tokio::test]
    async fn create_rejects_empty_feature_list() {
        let (catalog, _) = catalog(false);
        let mut input = valid_input();
        input.features = vec![];
        let err = catalog.create(Uuid::new_v4(), input).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn create_rejects_non_positive_price() {
        let (catalog, _) = catalog(false);
        let mut input = valid_input();
        input.price = dec!(0);
        let err = catalog.create(Uuid::new_v4(), input).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn remove_deactivates_when_open_orders_reference_the_service() {
        let (catalog, services) = catalog(true);
        let created = catalog.create(Uuid::new_v4(), valid_input()).await.unwrap();

        let removal = catalog.remove(Uuid::new_v4(), created.id).await.unwrap();
        assert_eq!(removal, Removal::Deactivated);

        let stored = services.get(created.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn remove_hard_deletes_when_unreferenced() {
        let (catalog, services) = catalog(false);
        let created = catalog.create(Uuid::new_v4(), valid_input()).await.unwrap();

        let removal = catalog.remove(Uuid::new_v4(), created.id).await.unwrap();
        assert_eq!(removal, Removal::Deleted);
        assert!(services.get(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_returns_active_newest_first() {
        let (catalog, _) = catalog(false);
        let actor = Uuid::new_v4();
        let first = catalog.create(actor, valid_input()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = catalog.create(actor, valid_input()).await.unwrap();

        catalog
            .update(
                actor,
                first.id,
                ServiceUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let listed = catalog.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, second.id);
    }
}
