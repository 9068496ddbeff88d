use crate::models::{ActivityLog, NewActivity, Notification, NotificationKind};
use crate::repository::{ActivityLogRepository, NotificationRepository};
use ampli_core::StorageError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Write side of user-facing notices.
pub struct Notifier {
    repo: Arc<dyn NotificationRepository>,
}

impl Notifier {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Fire-and-forget: a failed write is logged and never propagated.
    pub async fn notify(&self, recipient_id: Uuid, title: &str, message: &str, kind: NotificationKind) {
        let notification =
            Notification::new(recipient_id, title.to_string(), message.to_string(), kind);
        if let Err(e) = self.repo.create(&notification).await {
            tracing::warn!("notification write for {} failed: {}", recipient_id, e);
        }
    }

    /// Idempotent: re-marking an already-read notification succeeds without effect.
    pub async fn mark_read(&self, id: Uuid) -> Result<(), NotifyError> {
        match self.repo.mark_read(id).await {
            Ok(_) => Ok(()),
            Err(StorageError::NotFound(_)) => Err(NotifyError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Notification>, NotifyError> {
        Ok(self.repo.list_for_recipient(recipient_id).await?)
    }
}

/// Append-only audit trail writer.
pub struct ActivityRecorder {
    repo: Arc<dyn ActivityLogRepository>,
}

impl ActivityRecorder {
    pub fn new(repo: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repo }
    }

    /// Audit unavailability must not block the calling operation; failures are
    /// surfaced through logs only.
    pub async fn record(&self, entry: NewActivity) {
        let log = ActivityLog::from(entry);
        if let Err(e) = self.repo.append(&log).await {
            tracing::warn!("activity log write for action {} failed: {}", log.action, e);
        }
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<ActivityLog>, NotifyError> {
        Ok(self.repo.recent(limit).await?)
    }
}
