use crate::connector::ProviderConnector;
use crate::models::{Provider, ProviderService};
use crate::repository::ProviderRepository;
use ampli_core::{ProviderError, StorageError};
use ampli_notify::{ActivityRecorder, NewActivity};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("provider not found: {0}")]
    NotFound(Uuid),

    #[error("provider service not found: {0}")]
    ServiceNotFound(Uuid),

    #[error("catalog sync failed: {0}")]
    Sync(#[from] ProviderError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How many consecutive sync failures deactivate a provider.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    pub failure_threshold: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub api_url: String,
    pub api_key: String,
    pub rate_multiplier: Decimal,
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub upserted: usize,
    pub deactivated: usize,
}

/// The provider-service chosen to fulfil an order, with its effective cost.
#[derive(Debug, Clone)]
pub struct Selection {
    pub provider: Provider,
    pub service: ProviderService,
    /// `rate * rate_multiplier`, per delivered unit.
    pub unit_cost: Decimal,
}

/// Tracks fulfillment vendors and their synced catalogs. Read-only to the
/// order ledger; admins register, sync, and link.
pub struct ProviderRegistry {
    providers: Arc<dyn ProviderRepository>,
    connector: Arc<dyn ProviderConnector>,
    activity: Arc<ActivityRecorder>,
    policy: SyncPolicy,
}

impl ProviderRegistry {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        connector: Arc<dyn ProviderConnector>,
        activity: Arc<ActivityRecorder>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            providers,
            connector,
            activity,
            policy,
        }
    }

    /// Register a vendor. The endpoint must parse as http(s) and answer a
    /// catalog probe before the provider goes active.
    pub async fn register(
        &self,
        actor: Uuid,
        input: NewProvider,
    ) -> Result<Provider, RegistryError> {
        if input.name.trim().is_empty() {
            return Err(RegistryError::Validation("name must not be empty".into()));
        }
        if input.api_key.trim().is_empty() {
            return Err(RegistryError::Validation(
                "api key must not be empty".into(),
            ));
        }
        if input.rate_multiplier <= Decimal::ZERO {
            return Err(RegistryError::Validation(
                "rate multiplier must be positive".into(),
            ));
        }
        let parsed = Url::parse(&input.api_url)
            .map_err(|e| RegistryError::Validation(format!("invalid api url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RegistryError::Validation(
                "api url must be http or https".into(),
            ));
        }

        let mut provider = Provider::new(input.name, input.api_url, input.api_key);
        provider.rate_multiplier = input.rate_multiplier;
        provider.priority = input.priority;

        let client = self.connector.connect(&provider);
        client
            .list_services()
            .await
            .map_err(|e| RegistryError::Validation(format!("endpoint unreachable: {e}")))?;

        provider.is_active = true;
        self.providers.create(&provider).await?;

        self.activity
            .record(NewActivity {
                actor_id: Some(actor),
                action: "provider.register".into(),
                resource: Some("provider".into()),
                resource_id: Some(provider.id.to_string()),
                details: Some(format!("registered provider '{}'", provider.name)),
                ..Default::default()
            })
            .await;

        Ok(provider)
    }

    pub async fn get(&self, id: Uuid) -> Result<Provider, RegistryError> {
        self.providers
            .get(id)
            .await?
            .ok_or(RegistryError::NotFound(id))
    }

    pub async fn get_service(&self, id: Uuid) -> Result<ProviderService, RegistryError> {
        self.providers
            .get_service(id)
            .await?
            .ok_or(RegistryError::ServiceNotFound(id))
    }

    pub async fn services_for(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<ProviderService>, RegistryError> {
        Ok(self.providers.services_for_provider(provider_id).await?)
    }

    /// Active providers, highest priority first, cheapest markup breaking ties.
    pub async fn list_active(&self) -> Result<Vec<Provider>, RegistryError> {
        let mut providers: Vec<Provider> = self
            .providers
            .list()
            .await?
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        providers.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.rate_multiplier.cmp(&b.rate_multiplier))
        });
        Ok(providers)
    }

    /// Pull the provider's current catalog: upsert by `(provider_id,
    /// remote_id)`, deactivate rows the provider no longer lists. A failed
    /// fetch leaves existing rows untouched and counts toward the deactivation
    /// threshold.
    pub async fn sync_catalog(&self, provider_id: Uuid) -> Result<SyncReport, RegistryError> {
        let mut provider = self.get(provider_id).await?;
        let client = self.connector.connect(&provider);

        let remote = match client.list_services().await {
            Ok(remote) => remote,
            Err(e) => {
                provider.consecutive_failures += 1;
                let deactivate = provider.consecutive_failures >= self.policy.failure_threshold;
                if deactivate {
                    provider.is_active = false;
                    tracing::error!(
                        "provider {} deactivated after {} consecutive sync failures",
                        provider.name,
                        provider.consecutive_failures
                    );
                } else {
                    tracing::warn!("catalog sync for provider {} failed: {}", provider.name, e);
                }
                self.providers.update(&provider).await?;

                self.activity
                    .record(NewActivity {
                        action: "provider.sync_failed".into(),
                        resource: Some("provider".into()),
                        resource_id: Some(provider.id.to_string()),
                        details: Some(format!(
                            "{e} (failure {} of {})",
                            provider.consecutive_failures, self.policy.failure_threshold
                        )),
                        ..Default::default()
                    })
                    .await;

                return Err(e.into());
            }
        };

        let mut report = SyncReport::default();
        let mut present = Vec::with_capacity(remote.len());
        for entry in &remote {
            let row = ProviderService::from_remote(provider_id, entry);
            self.providers.upsert_service(&row).await?;
            present.push(entry.remote_id.clone());
            report.upserted += 1;
        }
        report.deactivated = self
            .providers
            .deactivate_services_missing(provider_id, &present)
            .await?;

        provider.consecutive_failures = 0;
        provider.last_sync_at = Some(Utc::now());
        self.providers.update(&provider).await?;

        tracing::info!(
            "synced provider {}: {} upserted, {} deactivated",
            provider.name,
            report.upserted,
            report.deactivated
        );
        Ok(report)
    }

    /// Point a synced SKU at the catalog service it fulfils (or unlink it).
    pub async fn link_catalog_service(
        &self,
        provider_service_id: Uuid,
        catalog_service_id: Option<Uuid>,
    ) -> Result<ProviderService, RegistryError> {
        let mut service = self.get_service(provider_service_id).await?;
        service.catalog_service_id = catalog_service_id;
        self.providers.update_service(&service).await?;
        Ok(service)
    }

    /// Selection policy: among active SKUs of active providers linked to the
    /// catalog service, lowest effective cost wins, higher provider priority
    /// breaks ties.
    pub async fn select_for_service(
        &self,
        catalog_service_id: Uuid,
    ) -> Result<Option<Selection>, StorageError> {
        let candidates = self
            .providers
            .candidates_for_service(catalog_service_id)
            .await?;

        let mut best: Option<Selection> = None;
        for service in candidates {
            let provider = match self.providers.get(service.provider_id).await? {
                Some(p) if p.is_active => p,
                _ => continue,
            };
            let unit_cost = provider.effective_rate(service.rate);
            let candidate = Selection {
                provider,
                service,
                unit_cost,
            };
            let better = match &best {
                None => true,
                Some(current) => match candidate.unit_cost.cmp(&current.unit_cost) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Equal => {
                        candidate.provider.priority > current.provider.priority
                    }
                    std::cmp::Ordering::Greater => false,
                },
            };
            if better {
                best = Some(candidate);
            }
        }
        Ok(best)
    }
}
