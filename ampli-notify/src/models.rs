use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Category of a user-facing notice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Info,
    OrderUpdate,
    Payment,
    System,
}

/// A user-facing notice. Mutated only by its recipient (mark-as-read).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(recipient_id: Uuid, title: String, message: String, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            title,
            message,
            kind,
            is_read: false,
            read_at: None,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    /// Marking an already-read notification is a no-op.
    pub fn mark_read(&mut self) {
        if !self.is_read {
            self.is_read = true;
            self.read_at = Some(Utc::now());
        }
    }
}

/// Request metadata captured alongside audit entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

/// Append-only audit entry. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Input for an audit entry, built by the calling operation.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub details: Option<String>,
    pub context: Option<RequestContext>,
}

impl From<NewActivity> for ActivityLog {
    fn from(entry: NewActivity) -> Self {
        let context = entry.context.unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action,
            resource: entry.resource,
            resource_id: entry.resource_id,
            details: entry.details,
            ip_address: context.ip_address,
            user_agent: context.user_agent,
            metadata: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }
}
