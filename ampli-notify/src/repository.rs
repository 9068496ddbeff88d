use crate::models::{ActivityLog, Notification};
use ampli_core::StorageError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), StorageError>;

    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StorageError>;

    /// Notifications for one recipient, newest first.
    async fn list_for_recipient(&self, recipient_id: Uuid)
        -> Result<Vec<Notification>, StorageError>;

    /// Returns whether the call changed anything (false for an already-read row).
    async fn mark_read(&self, id: Uuid) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn append(&self, entry: &ActivityLog) -> Result<(), StorageError>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<ActivityLog>, StorageError>;
}
