use crate::repository::OrderRepository;
use ampli_catalog::ServiceRepository;
use ampli_core::StorageError;
use ampli_ledger::TransactionRepository;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Read-time rollups for the admin dashboard. The user store lives outside
/// this boundary, so customers are counted as distinct order owners.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_customers: usize,
    pub total_orders: usize,
    pub total_transactions: usize,
    pub total_services: usize,
}

/// Computes stats on demand behind a short-TTL cache so bursts of dashboard
/// reads do not turn into recomputation storms.
pub struct DashboardAggregator {
    orders: Arc<dyn OrderRepository>,
    transactions: Arc<dyn TransactionRepository>,
    services: Arc<dyn ServiceRepository>,
    ttl: Duration,
    cached: RwLock<Option<(Instant, DashboardStats)>>,
}

impl DashboardAggregator {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        transactions: Arc<dyn TransactionRepository>,
        services: Arc<dyn ServiceRepository>,
        ttl: Duration,
    ) -> Self {
        Self {
            orders,
            transactions,
            services,
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats, StorageError> {
        if let Some((computed_at, stats)) = *self.cached.read().await {
            if computed_at.elapsed() < self.ttl {
                return Ok(stats);
            }
        }

        let stats = DashboardStats {
            total_customers: self.orders.distinct_customers().await?,
            total_orders: self.orders.count().await?,
            total_transactions: self.transactions.count().await?,
            total_services: self.services.count().await?,
        };
        *self.cached.write().await = Some((Instant::now(), stats));
        Ok(stats)
    }
}
