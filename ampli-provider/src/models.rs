use ampli_core::RemoteService;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An external fulfillment vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub api_url: String,
    /// Secret credential for the vendor API. Never logged.
    pub api_key: String,
    pub is_active: bool,
    /// Cost markup applied on top of the vendor's per-unit rate.
    pub rate_multiplier: Decimal,
    /// Selection order among providers with equal effective cost.
    pub priority: i32,
    /// Consecutive catalog-sync failures; drives deactivation at a threshold.
    pub consecutive_failures: u32,
    pub config: serde_json::Value,
    pub added_at: DateTime<Utc>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Provider {
    pub fn new(name: String, api_url: String, api_key: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            api_url,
            api_key,
            is_active: false,
            rate_multiplier: Decimal::ONE,
            priority: 0,
            consecutive_failures: 0,
            config: serde_json::json!({}),
            added_at: Utc::now(),
            last_sync_at: None,
        }
    }

    /// Per-unit cost of a vendor rate after this provider's markup.
    pub fn effective_rate(&self, rate: Decimal) -> Decimal {
        rate * self.rate_multiplier
    }
}

/// A specific SKU offered by a provider, synced from its catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderService {
    pub id: Uuid,
    pub provider_id: Uuid,
    /// The provider's own id for this SKU.
    pub remote_id: String,
    /// Which catalog service this SKU can fulfil. Managed by admins, preserved
    /// across syncs.
    pub catalog_service_id: Option<Uuid>,
    pub name: String,
    pub service_type: String,
    pub category: Option<String>,
    /// Cost per delivered unit, before the provider's rate multiplier.
    pub rate: Decimal,
    pub min: i32,
    pub max: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub synced_at: DateTime<Utc>,
}

impl ProviderService {
    pub fn from_remote(provider_id: Uuid, remote: &RemoteService) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            remote_id: remote.remote_id.clone(),
            catalog_service_id: None,
            name: remote.name.clone(),
            service_type: remote.service_type.clone(),
            category: remote.category.clone(),
            rate: remote.rate,
            min: remote.min,
            max: remote.max,
            description: remote.description.clone(),
            is_active: true,
            synced_at: Utc::now(),
        }
    }
}
