use crate::models::{OrderStatus, ServiceOrder};
use crate::repository::OrderRepository;
use crate::worker::DispatchQueue;
use ampli_catalog::{PricingPolicy, ServiceRepository};
use ampli_core::{ProviderError, ProviderOrderState, StorageError};
use ampli_ledger::{TransactionRepository, TransactionStatus};
use ampli_notify::{ActivityRecorder, NewActivity, NotificationKind, Notifier};
use ampli_provider::{Provider, ProviderConnector, ProviderRegistry, ProviderService, RegistryError};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("order not found: {0}")]
    NotFound(Uuid),

    #[error("service not found: {0}")]
    ServiceNotFound(Uuid),

    #[error("transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("no active provider can fulfil service {0}")]
    NoProviderAvailable(Uuid),

    #[error("fulfillment configuration missing: {0}")]
    ProviderUnavailable(String),

    #[error("quantity {quantity} outside provider bounds [{min}, {max}]")]
    QuantityOutOfRange { quantity: i32, min: i32, max: i32 },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("payment {0} has not succeeded")]
    PaymentNotSettled(Uuid),

    #[error("state check failed due to a concurrent update, safe to retry")]
    Conflict,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for OrderError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict { .. } => OrderError::Conflict,
            other => OrderError::Storage(other),
        }
    }
}

impl From<RegistryError> for OrderError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => {
                OrderError::ProviderUnavailable(format!("provider {id} is gone"))
            }
            RegistryError::ServiceNotFound(id) => {
                OrderError::ProviderUnavailable(format!("provider service {id} is gone"))
            }
            RegistryError::Validation(msg) => OrderError::Validation(msg),
            RegistryError::Sync(e) => OrderError::Provider(e),
            RegistryError::Storage(e) => e.into(),
        }
    }
}

/// Bounded retry budget for provider placement calls.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub link: String,
    pub quantity: i32,
}

/// Owns the order lifecycle exclusively. The provider registry is read-only
/// from here (selection and credential lookup); transactions are only
/// cross-referenced by id.
pub struct OrderLedger {
    orders: Arc<dyn OrderRepository>,
    services: Arc<dyn ServiceRepository>,
    registry: Arc<ProviderRegistry>,
    transactions: Arc<dyn TransactionRepository>,
    connector: Arc<dyn ProviderConnector>,
    pricing: Arc<dyn PricingPolicy>,
    notifier: Arc<Notifier>,
    activity: Arc<ActivityRecorder>,
    policy: DispatchPolicy,
    dispatcher: Option<DispatchQueue>,
}

impl OrderLedger {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        services: Arc<dyn ServiceRepository>,
        registry: Arc<ProviderRegistry>,
        transactions: Arc<dyn TransactionRepository>,
        connector: Arc<dyn ProviderConnector>,
        pricing: Arc<dyn PricingPolicy>,
        notifier: Arc<Notifier>,
        activity: Arc<ActivityRecorder>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            orders,
            services,
            registry,
            transactions,
            connector,
            pricing,
            notifier,
            activity,
            policy,
            dispatcher: None,
        }
    }

    /// Wire the background dispatch queue. Without one, `confirm_payment`
    /// leaves dispatching to the caller.
    pub fn set_dispatcher(&mut self, queue: DispatchQueue) {
        self.dispatcher = Some(queue);
    }

    /// Create an order in `pending`. Selection and bounds are checked before
    /// anything is persisted; payment gating keeps dispatch a separate step.
    pub async fn place_order(&self, input: NewOrder) -> Result<ServiceOrder, OrderError> {
        if input.link.trim().is_empty() {
            return Err(OrderError::Validation("target link must not be empty".into()));
        }
        if input.quantity <= 0 {
            return Err(OrderError::Validation("quantity must be positive".into()));
        }

        let service = self
            .services
            .get(input.service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(OrderError::ServiceNotFound(input.service_id))?;

        let selection = self
            .registry
            .select_for_service(service.id)
            .await?
            .ok_or(OrderError::NoProviderAvailable(service.id))?;

        if input.quantity < selection.service.min || input.quantity > selection.service.max {
            return Err(OrderError::QuantityOutOfRange {
                quantity: input.quantity,
                min: selection.service.min,
                max: selection.service.max,
            });
        }

        let quantity = Decimal::from(input.quantity);
        let original_price = service.price * quantity;
        let final_price = self.pricing.final_price(original_price, input.quantity);
        if final_price < Decimal::ZERO {
            return Err(OrderError::Validation(
                "pricing policy produced a negative price".into(),
            ));
        }
        let provider_cost = selection.unit_cost * quantity;

        let order = ServiceOrder::new(
            input.customer_id,
            service.id,
            selection.service.id,
            input.link,
            input.quantity,
            original_price,
            final_price,
            provider_cost,
        );
        self.orders.create(&order).await?;

        tracing::info!(
            "order {} placed: {} x '{}' via provider {}",
            order.id,
            order.quantity,
            service.title,
            selection.provider.name
        );
        self.activity
            .record(NewActivity {
                actor_id: Some(input.customer_id),
                action: "order.place".into(),
                resource: Some("order".into()),
                resource_id: Some(order.id.to_string()),
                details: Some(format!(
                    "quantity {} of service '{}'",
                    order.quantity, service.title
                )),
                ..Default::default()
            })
            .await;

        Ok(order)
    }

    /// Payment gate: `pending -> processing`, only against a succeeded
    /// transaction. Queues dispatch when a worker is wired.
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<ServiceOrder, OrderError> {
        let order = self.get(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Processing,
            });
        }

        let transaction = self
            .transactions
            .get(transaction_id)
            .await?
            .ok_or(OrderError::TransactionNotFound(transaction_id))?;
        if transaction.status != TransactionStatus::Succeeded {
            return Err(OrderError::PaymentNotSettled(transaction_id));
        }

        let mut next = order;
        next.transition(OrderStatus::Processing);
        if let Some(map) = next.metadata.as_object_mut() {
            map.insert("transaction_id".into(), json!(transaction_id));
        } else {
            next.metadata = json!({ "transaction_id": transaction_id });
        }
        self.orders
            .update_guarded(OrderStatus::Pending, &next)
            .await?;

        self.notifier
            .notify(
                next.customer_id,
                "Payment confirmed",
                &format!("Order {} is queued for fulfillment", next.id),
                NotificationKind::Payment,
            )
            .await;

        if let Some(queue) = &self.dispatcher {
            queue.enqueue(next.id).await;
        }

        Ok(next)
    }

    /// Submit the order to its provider. The `processing -> in_progress` claim
    /// is a guarded write, so of two concurrent dispatchers exactly one talks
    /// to the provider; the other observes the winner's result.
    pub async fn dispatch(&self, order_id: Uuid) -> Result<ServiceOrder, OrderError> {
        let order = self.get(order_id).await?;
        match order.status {
            OrderStatus::Processing => {}
            // Already claimed or fulfilled: report the current state.
            OrderStatus::InProgress | OrderStatus::Completed | OrderStatus::Partial => {
                return Ok(order)
            }
            from => {
                return Err(OrderError::InvalidTransition {
                    from,
                    to: OrderStatus::InProgress,
                })
            }
        }

        let (provider, provider_service) = self.fulfillment_handles(&order).await?;

        let mut claimed = order.clone();
        claimed.transition(OrderStatus::InProgress);
        match self
            .orders
            .update_guarded(OrderStatus::Processing, &claimed)
            .await
        {
            Ok(()) => {}
            Err(StorageError::Conflict { .. }) => {
                let current = self.get(order_id).await?;
                return match current.status {
                    OrderStatus::InProgress | OrderStatus::Completed | OrderStatus::Partial => {
                        Ok(current)
                    }
                    _ => Err(OrderError::Conflict),
                };
            }
            Err(e) => return Err(e.into()),
        }

        let client = self.connector.connect(&provider);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match client
                .place_order(&provider_service.remote_id, &claimed.link, claimed.quantity)
                .await
            {
                Ok(provider_order_id) => {
                    tracing::info!(
                        "order {} dispatched to {} as {}",
                        claimed.id,
                        provider.name,
                        provider_order_id
                    );
                    claimed.provider_order_id = Some(provider_order_id);
                    claimed.updated_at = Utc::now();
                    self.orders.update(&claimed).await?;
                    self.notifier
                        .notify(
                            claimed.customer_id,
                            "Order in progress",
                            &format!("Order {} was handed to fulfillment", claimed.id),
                            NotificationKind::OrderUpdate,
                        )
                        .await;
                    return Ok(claimed);
                }
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let backoff = self.policy.backoff_base * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        "dispatch attempt {} for order {} failed: {}, retrying in {:?}",
                        attempt,
                        claimed.id,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_transient() => {
                    tracing::error!(
                        "order {} failed after {} dispatch attempts: {}",
                        claimed.id,
                        attempt,
                        e
                    );
                    return self
                        .settle_dispatch_failure(
                            claimed,
                            OrderStatus::Failed,
                            format!("dispatch failed after {attempt} attempts: {e}"),
                        )
                        .await;
                }
                Err(e) => {
                    tracing::warn!("provider rejected order {}: {}", claimed.id, e);
                    return self
                        .settle_dispatch_failure(
                            claimed,
                            OrderStatus::Cancelled,
                            format!("provider rejected order: {e}"),
                        )
                        .await;
                }
            }
        }
    }

    /// Poll the provider and fold its answer into local state. Safe to call
    /// repeatedly; a terminal order is returned untouched, and the write is
    /// all-or-nothing per order.
    pub async fn refresh_status(&self, order_id: Uuid) -> Result<ServiceOrder, OrderError> {
        let order = self.get(order_id).await?;
        if order.status.is_terminal() {
            return Ok(order);
        }
        let Some(provider_order_id) = order.provider_order_id.clone() else {
            // Nothing dispatched yet, nothing to reconcile.
            return Ok(order);
        };

        let (provider, _provider_service) = self.fulfillment_handles(&order).await?;
        let client = self.connector.connect(&provider);
        let remote = client.order_status(&provider_order_id).await?;

        let mut next = order.clone();
        next.start_count = remote.start_count.or(next.start_count);
        next.remains = remote.remains.or(next.remains);
        next.updated_at = Utc::now();

        let target = match remote.state {
            ProviderOrderState::Completed => {
                if remote.remains.unwrap_or(0) == 0 {
                    Some(OrderStatus::Completed)
                } else {
                    Some(OrderStatus::Partial)
                }
            }
            ProviderOrderState::Partial => Some(OrderStatus::Partial),
            ProviderOrderState::Canceled => Some(OrderStatus::Cancelled),
            ProviderOrderState::Pending | ProviderOrderState::InProgress => None,
        };
        if let Some(target) = target {
            if target != next.status {
                if !next.status.can_transition_to(target) {
                    tracing::warn!(
                        "ignoring provider status for order {}: {} does not follow {}",
                        next.id,
                        target,
                        next.status
                    );
                    return Ok(order);
                }
                next.transition(target);
            }
        }

        match self.orders.update_guarded(order.status, &next).await {
            Ok(()) => {
                if next.status != order.status {
                    self.notify_refresh_outcome(&next).await;
                }
                Ok(next)
            }
            // Another refresher or a cancellation won; their state stands.
            Err(StorageError::Conflict { .. }) => self.get(order_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Customer-facing cancellation, permitted before dispatch only.
    pub async fn cancel(&self, order_id: Uuid) -> Result<ServiceOrder, OrderError> {
        let order = self.get(order_id).await?;
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Processing) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let mut next = order.clone();
        next.transition(OrderStatus::Cancelled);
        self.orders.update_guarded(order.status, &next).await?;

        self.notifier
            .notify(
                next.customer_id,
                "Order cancelled",
                &format!("Order {} was cancelled", next.id),
                NotificationKind::OrderUpdate,
            )
            .await;

        Ok(next)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<ServiceOrder, OrderError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<ServiceOrder>, OrderError> {
        Ok(self.orders.list_for_customer(customer_id).await?)
    }

    /// Orders the status sweep should poll.
    pub async fn refreshable(&self) -> Result<Vec<ServiceOrder>, OrderError> {
        Ok(self.orders.list_refreshable().await?)
    }

    async fn fulfillment_handles(
        &self,
        order: &ServiceOrder,
    ) -> Result<(Provider, ProviderService), OrderError> {
        let provider_service = self.registry.get_service(order.provider_service_id).await?;
        let provider = self.registry.get(provider_service.provider_id).await?;
        Ok((provider, provider_service))
    }

    async fn settle_dispatch_failure(
        &self,
        mut order: ServiceOrder,
        to: OrderStatus,
        note: String,
    ) -> Result<ServiceOrder, OrderError> {
        order.notes = Some(note);
        order.transition(to);
        self.orders
            .update_guarded(OrderStatus::InProgress, &order)
            .await?;

        let title = match to {
            OrderStatus::Cancelled => "Order cancelled",
            _ => "Order failed",
        };
        self.notifier
            .notify(
                order.customer_id,
                title,
                &format!("Order {} could not be fulfilled", order.id),
                NotificationKind::OrderUpdate,
            )
            .await;

        Ok(order)
    }

    async fn notify_refresh_outcome(&self, order: &ServiceOrder) {
        let (title, message) = match order.status {
            OrderStatus::Completed => (
                "Order completed",
                format!("Order {} was fully delivered", order.id),
            ),
            OrderStatus::Partial => (
                "Order partially delivered",
                format!(
                    "Order {} was partially delivered, {} remaining",
                    order.id,
                    order.remains.unwrap_or_default()
                ),
            ),
            OrderStatus::Cancelled => (
                "Order cancelled",
                format!("Order {} was cancelled by the provider", order.id),
            ),
            _ => return,
        };
        self.notifier
            .notify(
                order.customer_id,
                title,
                &message,
                NotificationKind::OrderUpdate,
            )
            .await;
    }
}
