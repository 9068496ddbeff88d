use ampli_core::StorageError;
use ampli_notify::{ActivityLog, ActivityLogRepository, Notification, NotificationRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory notification store.
pub struct MemoryNotificationRepository {
    rows: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryNotificationRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<(), StorageError> {
        self.rows
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>, StorageError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> Result<Vec<Notification>, StorageError> {
        let mut out: Vec<Notification> = self
            .rows
            .read()
            .await
            .values()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn mark_read(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        if row.is_read {
            return Ok(false);
        }
        row.mark_read();
        Ok(true)
    }
}

/// In-memory audit trail. Append-only; nothing here mutates or deletes.
pub struct MemoryActivityLogRepository {
    rows: RwLock<Vec<ActivityLog>>,
}

impl MemoryActivityLogRepository {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryActivityLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryActivityLogRepository {
    async fn append(&self, entry: &ActivityLog) -> Result<(), StorageError> {
        self.rows.write().await.push(entry.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ActivityLog>, StorageError> {
        let rows = self.rows.read().await;
        let mut out: Vec<ActivityLog> = rows.iter().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit);
        Ok(out)
    }
}
