use crate::client::HttpProviderClient;
use crate::models::Provider;
use ampli_core::ProviderClient;
use std::sync::Arc;
use std::time::Duration;

/// Builds a client for a provider from its stored endpoint and credential.
pub trait ProviderConnector: Send + Sync {
    fn connect(&self, provider: &Provider) -> Arc<dyn ProviderClient>;
}

/// Production connector: one shared reqwest client, per-provider credentials.
pub struct HttpConnector {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ProviderConnector for HttpConnector {
    fn connect(&self, provider: &Provider) -> Arc<dyn ProviderClient> {
        Arc::new(HttpProviderClient::new(
            self.http.clone(),
            provider.api_url.clone(),
            provider.api_key.clone(),
            self.timeout,
        ))
    }
}
