pub mod models;
pub mod repository;
pub mod sink;

pub use models::{ActivityLog, NewActivity, Notification, NotificationKind, RequestContext};
pub use repository::{ActivityLogRepository, NotificationRepository};
pub use sink::{ActivityRecorder, Notifier, NotifyError};
