use crate::connector::ProviderConnector;
use crate::models::Provider;
use ampli_core::{
    ProviderClient, ProviderError, ProviderOrderState, ProviderOrderStatus, RemoteService,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scriptable provider double. Defaults: placements return sequential order
/// ids, status queries report completion with nothing remaining, and the
/// catalog is whatever `set_services` seeded.
#[derive(Default)]
pub struct MockProviderClient {
    place_calls: AtomicUsize,
    status_calls: AtomicUsize,
    place_script: Mutex<VecDeque<Result<String, ProviderError>>>,
    status_script: Mutex<VecDeque<Result<ProviderOrderStatus, ProviderError>>>,
    services_script: Mutex<VecDeque<Result<Vec<RemoteService>, ProviderError>>>,
    services: Mutex<Vec<RemoteService>>,
}

impl MockProviderClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placed(&self) -> usize {
        self.place_calls.load(Ordering::SeqCst)
    }

    pub fn status_queries(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn script_place(&self, result: Result<String, ProviderError>) {
        self.place_script.lock().unwrap().push_back(result);
    }

    pub fn script_status(&self, result: Result<ProviderOrderStatus, ProviderError>) {
        self.status_script.lock().unwrap().push_back(result);
    }

    pub fn script_services(&self, result: Result<Vec<RemoteService>, ProviderError>) {
        self.services_script.lock().unwrap().push_back(result);
    }

    pub fn set_services(&self, services: Vec<RemoteService>) {
        *self.services.lock().unwrap() = services;
    }
}

#[async_trait]
impl ProviderClient for MockProviderClient {
    async fn place_order(
        &self,
        _remote_service_id: &str,
        _link: &str,
        _quantity: i32,
    ) -> Result<String, ProviderError> {
        let call = self.place_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(scripted) = self.place_script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(format!("mock-{call}"))
    }

    async fn order_status(
        &self,
        _provider_order_id: &str,
    ) -> Result<ProviderOrderStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.status_script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(ProviderOrderStatus {
            state: ProviderOrderState::Completed,
            start_count: Some(0),
            remains: Some(0),
        })
    }

    async fn list_services(&self) -> Result<Vec<RemoteService>, ProviderError> {
        if let Some(scripted) = self.services_script.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(self.services.lock().unwrap().clone())
    }
}

/// Connector handing out the same mock client for every provider.
pub struct MockConnector {
    pub client: Arc<MockProviderClient>,
}

impl MockConnector {
    pub fn new(client: Arc<MockProviderClient>) -> Self {
        Self { client }
    }
}

impl ProviderConnector for MockConnector {
    fn connect(&self, _provider: &Provider) -> Arc<dyn ProviderClient> {
        self.client.clone()
    }
}
