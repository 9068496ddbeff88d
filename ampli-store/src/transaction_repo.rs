use ampli_core::StorageError;
use ampli_ledger::{Transaction, TransactionRepository, TransactionStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory transaction store with the status compare-and-swap webhook
/// idempotency rides on.
pub struct MemoryTransactionRepository {
    rows: RwLock<HashMap<Uuid, Transaction>>,
}

impl MemoryTransactionRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn create(&self, transaction: &Transaction) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&transaction.id) {
            return Err(StorageError::Conflict {
                expected: "absent".into(),
                found: "present".into(),
            });
        }
        rows.insert(transaction.id, transaction.clone());
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
        transaction: &Transaction,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows.write().await;
        let current = rows
            .get(&transaction.id)
            .ok_or_else(|| StorageError::NotFound(transaction.id.to_string()))?;
        if current.status != expected {
            return Err(StorageError::Conflict {
                expected: expected.to_string(),
                found: current.status.to_string(),
            });
        }
        rows.insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Transaction>, StorageError> {
        let mut out: Vec<Transaction> = self.rows.read().await.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }
}
