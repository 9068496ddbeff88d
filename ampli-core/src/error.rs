/// Errors surfaced by the storage capability.
///
/// `Conflict` is how a guarded write reports a failed state check; callers
/// re-read and either adopt the winner's result or retry the operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("state check failed: expected {expected}, found {found}")]
    Conflict { expected: String, found: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}
