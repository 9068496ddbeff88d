use crate::models::{Transaction, TransactionStatus};
use crate::repository::TransactionRepository;
use ampli_core::StorageError;
use ampli_notify::{NotificationKind, Notifier};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("transaction not found: {0}")]
    NotFound(Uuid),

    #[error("invalid transaction transition from {from} to {to}")]
    InvalidTransition { from: TransactionStatus, to: TransactionStatus },

    #[error("state check failed due to a concurrent update, safe to retry")]
    Conflict,

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict { .. } => LedgerError::Conflict,
            other => LedgerError::Storage(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub customer_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: String,
    pub fees: Decimal,
    pub description: Option<String>,
}

/// Payment event ledger. Settlement is driven by gateway webhooks, which may
/// arrive more than once; `mark_succeeded` is idempotent per gateway reference.
pub struct TransactionLedger {
    transactions: Arc<dyn TransactionRepository>,
    notifier: Arc<Notifier>,
}

impl TransactionLedger {
    pub fn new(transactions: Arc<dyn TransactionRepository>, notifier: Arc<Notifier>) -> Self {
        Self {
            transactions,
            notifier,
        }
    }

    pub async fn record(&self, input: NewTransaction) -> Result<Transaction, LedgerError> {
        if input.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation("amount must be positive".into()));
        }
        if input.fees < Decimal::ZERO || input.fees > input.amount {
            return Err(LedgerError::Validation(
                "fees must be within [0, amount]".into(),
            ));
        }

        let mut tx = Transaction::new(input.customer_id, input.amount, input.currency, input.fees);
        tx.description = input.description;
        self.transactions.create(&tx).await?;
        Ok(tx)
    }

    pub async fn get(&self, id: Uuid) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    /// Settle a pending transaction. Repeated delivery with the same gateway
    /// reference returns the already-settled row and credits nothing twice.
    pub async fn mark_succeeded(
        &self,
        id: Uuid,
        gateway_reference: &str,
    ) -> Result<Transaction, LedgerError> {
        let tx = self.get(id).await?;

        match tx.status {
            TransactionStatus::Succeeded => {
                if tx.gateway_reference.as_deref() == Some(gateway_reference) {
                    return Ok(tx);
                }
                Err(LedgerError::InvalidTransition {
                    from: TransactionStatus::Succeeded,
                    to: TransactionStatus::Succeeded,
                })
            }
            TransactionStatus::Failed | TransactionStatus::Refunded => {
                Err(LedgerError::InvalidTransition {
                    from: tx.status,
                    to: TransactionStatus::Succeeded,
                })
            }
            TransactionStatus::Pending => {
                let mut next = tx.clone();
                next.status = TransactionStatus::Succeeded;
                next.gateway_reference = Some(gateway_reference.to_string());
                next.net_amount = Some(next.amount - next.fees);
                next.processed_at = Some(Utc::now());
                next.updated_at = Utc::now();

                match self
                    .transactions
                    .update_guarded(TransactionStatus::Pending, &next)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(
                            "transaction {} settled, net {} {}",
                            next.id,
                            next.net_amount.unwrap_or_default(),
                            next.currency
                        );
                        self.notify_outcome(&next, "Payment received").await;
                        Ok(next)
                    }
                    Err(StorageError::Conflict { .. }) => {
                        // Lost a race against a duplicate delivery; adopt the
                        // winner's result when it settled the same reference.
                        let current = self.get(id).await?;
                        if current.status == TransactionStatus::Succeeded
                            && current.gateway_reference.as_deref() == Some(gateway_reference)
                        {
                            Ok(current)
                        } else {
                            Err(LedgerError::Conflict)
                        }
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    /// Terminal failure, e.g. a declined card.
    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Transaction, LedgerError> {
        let tx = self.get(id).await?;
        if tx.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                from: tx.status,
                to: TransactionStatus::Failed,
            });
        }

        let mut next = tx;
        next.status = TransactionStatus::Failed;
        if let Some(map) = next.metadata.as_object_mut() {
            map.insert("failure_reason".into(), json!(reason));
        } else {
            next.metadata = json!({ "failure_reason": reason });
        }
        next.updated_at = Utc::now();
        self.transactions
            .update_guarded(TransactionStatus::Pending, &next)
            .await?;

        self.notify_outcome(&next, "Payment failed").await;
        Ok(next)
    }

    pub async fn mark_refunded(&self, id: Uuid) -> Result<Transaction, LedgerError> {
        let tx = self.get(id).await?;
        if tx.status != TransactionStatus::Succeeded {
            return Err(LedgerError::InvalidTransition {
                from: tx.status,
                to: TransactionStatus::Refunded,
            });
        }

        let mut next = tx;
        next.status = TransactionStatus::Refunded;
        next.updated_at = Utc::now();
        self.transactions
            .update_guarded(TransactionStatus::Succeeded, &next)
            .await?;

        self.notify_outcome(&next, "Payment refunded").await;
        Ok(next)
    }

    /// Webhook routing: resolve a gateway reference to its transaction.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.transactions.get_by_reference(reference).await?)
    }

    pub async fn list(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.transactions.list().await?)
    }

    async fn notify_outcome(&self, tx: &Transaction, title: &str) {
        if let Some(customer_id) = tx.customer_id {
            let message = format!("{} {} ({})", tx.amount, tx.currency, tx.status);
            self.notifier
                .notify(customer_id, title, &message, NotificationKind::Payment)
                .await;
        }
    }
}
