//! Shared in-memory doubles for ledger and worker tests.

use crate::ledger::{DispatchPolicy, NewOrder, OrderLedger};
use crate::models::{OrderStatus, ServiceOrder};
use crate::repository::OrderRepository;
use ampli_catalog::{PassThrough, Service, ServiceRepository};
use ampli_core::{RemoteService, StorageError};
use ampli_ledger::{Transaction, TransactionRepository, TransactionStatus};
use ampli_notify::{
    ActivityLog, ActivityLogRepository, ActivityRecorder, Notification, NotificationRepository,
    Notifier,
};
use ampli_provider::{
    MockConnector, MockProviderClient, Provider, ProviderRegistry, ProviderRepository,
    ProviderService, SyncPolicy,
};
use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub(crate) struct TestOrders {
    rows: RwLock<HashMap<Uuid, ServiceOrder>>,
}

#[async_trait]
impl OrderRepository for TestOrders {
    async fn create(&self, order: &ServiceOrder) -> Result<(), StorageError> {
        self.rows.write().await.insert(order.id, order.clone());
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

#[derive(Default)]
pub(crate) struct TestServices {
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
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    async fn hard_delete(&self, id: Uuid) -> Result<(), StorageError> {
        self.rows.write().await.remove(&id);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }
}

#[derive(Default)]
pub(crate) struct TestProviders {
    providers: RwLock<HashMap<Uuid, Provider>>,
    services: RwLock<HashMap<Uuid, ProviderService>>,
}

#[async_trait]
impl ProviderRepository for TestProviders {
    async fn create(&self, provider: &Provider) -> Result<(), StorageError> {
        self.providers
            .write()
            .await
            .insert(provider.id, provider.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Provider>, StorageError> {
        Ok(self.providers.read().await.get(&id).cloned())
    }

    async fn update(&self, provider: &Provider) -> Result<(), StorageError> {
        self.providers
            .write()
            .await
            .insert(provider.id, provider.clone());
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

#[derive(Default)]
pub(crate) struct TestTransactions {
    rows: RwLock<HashMap<Uuid, Transaction>>,
}

#[async_trait]
impl TransactionRepository for TestTransactions {
    async fn create(&self, tx: &Transaction) -> Result<(), StorageError> {
        self.rows.write().await.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>, StorageError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|t| t.gateway_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update_guarded(
        &self,
        expected: TransactionStatus,
        tx: &Transaction,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&tx.id)
            .ok_or_else(|| StorageError::NotFound(tx.id.to_string()))?;
        if current.status != expected {
            return Err(StorageError::Conflict {
                expected: expected.to_string(),
                found: current.status.to_string(),
            });
        }
        rows.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Transaction>, StorageError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }
}

#[derive(Default)]
pub(crate) struct TestNotifications {
    pub rows: RwLock<Vec<Notification>>,
}

#[async_trait]
impl NotificationRepository for TestNotifications {
    async fn create(&self, notification: &Notification) -> Result<(), StorageError> {
        self.rows.write().await.push(notification.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StorageError> {
        Ok(self.rows.read().await.iter().find(|n| n.id == id).cloned())
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<Notification>, StorageError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        if row.is_read {
            return Ok(false);
        }
        row.mark_read();
        Ok(true)
    }
}

pub(crate) struct NullActivity;

#[async_trait]
impl ActivityLogRepository for NullActivity {
    async fn append(&self, _entry: &ActivityLog) -> Result<(), StorageError> {
        Ok(())
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<ActivityLog>, StorageError> {
        Ok(vec![])
    }
}

/// Fully wired fixture: one catalog service backed by one active provider SKU
/// (rate 0.01/unit, bounds 100..=5000) behind a scriptable mock client.
pub(crate) struct World {
    pub orders: Arc<TestOrders>,
    pub services: Arc<TestServices>,
    pub providers: Arc<TestProviders>,
    pub transactions: Arc<TestTransactions>,
    pub notifications: Arc<TestNotifications>,
    pub mock: Arc<MockProviderClient>,
    pub registry: Arc<ProviderRegistry>,
    pub customer_id: Uuid,
    pub service: Service,
    pub provider: Provider,
    pub provider_service: ProviderService,
}

impl World {
    pub async fn new() -> Self {
        let orders = Arc::new(TestOrders::default());
        let services = Arc::new(TestServices::default());
        let providers = Arc::new(TestProviders::default());
        let transactions = Arc::new(TestTransactions::default());
        let notifications = Arc::new(TestNotifications::default());
        let mock = Arc::new(MockProviderClient::new());
        let registry = Arc::new(ProviderRegistry::new(
            providers.clone(),
            Arc::new(MockConnector::new(mock.clone())),
            Arc::new(ActivityRecorder::new(Arc::new(NullActivity))),
            SyncPolicy::default(),
        ));

        let service = Service::new(
            "Instagram Followers".into(),
            dec!(0.015),
            vec!["Real accounts".into()],
        );
        services.create(&service).await.unwrap();

        let mut provider = Provider::new(
            "PanelOne".into(),
            "https://panel.example.com/api/v2".into(),
            "secret".into(),
        );
        provider.is_active = true;
        providers.create(&provider).await.unwrap();

        let mut provider_service = ProviderService::from_remote(
            provider.id,
            &RemoteService {
                remote_id: "2214".into(),
                name: "IG Followers [Real]".into(),
                service_type: "default".into(),
                category: Some("Instagram".into()),
                rate: dec!(0.01),
                min: 100,
                max: 5000,
                description: None,
            },
        );
        provider_service.catalog_service_id = Some(service.id);
        providers.update_service(&provider_service).await.unwrap();

        Self {
            orders,
            services,
            providers,
            transactions,
            notifications,
            mock,
            registry,
            customer_id: Uuid::new_v4(),
            service,
            provider,
            provider_service,
        }
    }

    pub fn ledger(&self) -> OrderLedger {
        OrderLedger::new(
            self.orders.clone(),
            self.services.clone(),
            self.registry.clone(),
            self.transactions.clone(),
            Arc::new(MockConnector::new(self.mock.clone())),
            Arc::new(PassThrough),
            Arc::new(Notifier::new(self.notifications.clone())),
            Arc::new(ActivityRecorder::new(Arc::new(NullActivity))),
            DispatchPolicy {
                max_attempts: 3,
                backoff_base: Duration::from_millis(1),
            },
        )
    }

    pub async fn place_default_order(&self, ledger: &OrderLedger) -> ServiceOrder {
        ledger
            .place_order(NewOrder {
                customer_id: self.customer_id,
                service_id: self.service.id,
                link: "https://instagram.com/example".into(),
                quantity: 1000,
            })
            .await
            .unwrap()
    }

    pub async fn settled_transaction(&self) -> Transaction {
        let mut tx = Transaction::new(Some(self.customer_id), dec!(15.00), "USD".into(), dec!(0));
        tx.status = TransactionStatus::Succeeded;
        tx.gateway_reference = Some("pi_test".into());
        tx.net_amount = Some(tx.amount);
        self.transactions.create(&tx).await.unwrap();
        tx
    }

    pub async fn pending_transaction(&self) -> Transaction {
        let tx = Transaction::new(Some(self.customer_id), dec!(15.00), "USD".into(), dec!(0));
        self.transactions.create(&tx).await.unwrap();
        tx
    }
}
