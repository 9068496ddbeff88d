use crate::ledger::{OrderError, OrderLedger};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Producer side of the dispatch queue. Keeps at most one pending entry per
/// order; dispatch itself is additionally guarded by the status claim.
#[derive(Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<Uuid>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
}

pub struct DispatchReceiver {
    rx: mpsc::UnboundedReceiver<Uuid>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
}

impl DispatchQueue {
    pub fn new() -> (Self, DispatchReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(Mutex::new(HashSet::new()));
        (
            Self {
                tx,
                pending: pending.clone(),
            },
            DispatchReceiver { rx, pending },
        )
    }

    /// Returns false when the order is already queued.
    pub async fn enqueue(&self, order_id: Uuid) -> bool {
        let mut pending = self.pending.lock().await;
        if !pending.insert(order_id) {
            return false;
        }
        if self.tx.send(order_id).is_err() {
            tracing::error!("dispatch worker is gone, order {} not queued", order_id);
            pending.remove(&order_id);
            return false;
        }
        true
    }
}

/// Consumes the dispatch queue off the request path, one order at a time.
pub struct DispatchWorker {
    ledger: Arc<OrderLedger>,
    receiver: DispatchReceiver,
}

impl DispatchWorker {
    pub fn new(ledger: Arc<OrderLedger>, receiver: DispatchReceiver) -> Self {
        Self { ledger, receiver }
    }

    pub async fn run(mut self) {
        tracing::info!("dispatch worker started");
        while let Some(order_id) = self.receiver.rx.recv().await {
            self.receiver.pending.lock().await.remove(&order_id);
            match self.ledger.dispatch(order_id).await {
                Ok(order) => {
                    tracing::info!("order {} dispatched, status {}", order_id, order.status)
                }
                Err(OrderError::Conflict) => {
                    tracing::debug!("order {} was dispatched concurrently", order_id)
                }
                Err(e) => tracing::error!("dispatch of order {} failed: {}", order_id, e),
            }
        }
        tracing::info!("dispatch queue closed, worker stopping");
    }
}

/// Cadence and batching for the reconciliation sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    pub interval: Duration,
    /// Orders polled back-to-back before pausing, to respect provider rate
    /// limits.
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            batch_size: 20,
            batch_pause: Duration::from_millis(500),
        }
    }
}

/// Periodic reconciliation of non-terminal orders against provider state.
/// Each order's refresh is atomic, so aborting a sweep mid-way leaves no
/// partial transition.
pub struct StatusSweeper {
    ledger: Arc<OrderLedger>,
    policy: SweepPolicy,
}

impl StatusSweeper {
    pub fn new(ledger: Arc<OrderLedger>, policy: SweepPolicy) -> Self {
        Self { ledger, policy }
    }

    pub async fn run(self) {
        tracing::info!(
            "status sweeper started, interval {:?}",
            self.policy.interval
        );
        let mut tick = tokio::time::interval(self.policy.interval);
        loop {
            tick.tick().await;
            let refreshed = self.sweep_once().await;
            if refreshed > 0 {
                tracing::info!("status sweep refreshed {} orders", refreshed);
            }
        }
    }

    /// One pass over every refreshable order. Returns how many were polled
    /// successfully.
    pub async fn sweep_once(&self) -> usize {
        let orders = match self.ledger.refreshable().await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!("status sweep could not list orders: {}", e);
                return 0;
            }
        };

        let batch_size = self.policy.batch_size.max(1);
        let mut refreshed = 0;
        for chunk in orders.chunks(batch_size) {
            for order in chunk {
                match self.ledger.refresh_status(order.id).await {
                    Ok(_) => refreshed += 1,
                    Err(e) => {
                        tracing::warn!("status refresh for order {} failed: {}", order.id, e)
                    }
                }
            }
            if chunk.len() == batch_size {
                tokio::time::sleep(self.policy.batch_pause).await;
            }
        }
        refreshed
    }
}
