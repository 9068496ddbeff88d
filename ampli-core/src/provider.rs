use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Failure classes for provider API calls. Transient failures are retried by
/// callers with a bounded budget; the rest are terminal for the attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transient provider failure: {0}")]
    Transient(String),

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("unexpected provider response: {0}")]
    Protocol(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

/// Provider status vocabulary normalized across vendors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderOrderState {
    Pending,
    InProgress,
    Completed,
    Partial,
    Canceled,
}

/// Progress telemetry returned by a provider status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderOrderStatus {
    pub state: ProviderOrderState,
    pub start_count: Option<i32>,
    pub remains: Option<i32>,
}

/// One entry of a provider's sellable catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteService {
    pub remote_id: String,
    pub name: String,
    pub service_type: String,
    pub category: Option<String>,
    /// Cost per delivered unit, before the provider's rate multiplier.
    pub rate: Decimal,
    pub min: i32,
    pub max: i32,
    pub description: Option<String>,
}

/// Normalized view of a vendor-specific fulfillment API.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Submit an order for fulfillment, returning the provider's order id.
    async fn place_order(
        &self,
        remote_service_id: &str,
        link: &str,
        quantity: i32,
    ) -> Result<String, ProviderError>;

    /// Query progress for a previously placed order.
    async fn order_status(
        &self,
        provider_order_id: &str,
    ) -> Result<ProviderOrderStatus, ProviderError>;

    /// Fetch the provider's current service catalog.
    async fn list_services(&self) -> Result<Vec<RemoteService>, ProviderError>;
}
