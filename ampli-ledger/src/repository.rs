use crate::models::{Transaction, TransactionStatus};
use ampli_core::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create(&self, transaction: &Transaction) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Transaction>, StorageError>;

    /// Lookup by gateway reference, the idempotency key for webhook delivery.
    async fn get_by_reference(&self, reference: &str) -> Result<Option<Transaction>, StorageError>;

    /// Whole-row write conditional on the current status matching `expected`.
    /// Fails with `StorageError::Conflict` otherwise.
    async fn update_guarded(
        &self,
        expected: TransactionStatus,
        transaction: &Transaction,
    ) -> Result<(), StorageError>;

    /// All transactions, newest first.
    async fn list(&self) -> Result<Vec<Transaction>, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;
}
