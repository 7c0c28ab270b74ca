use crate::locking::ResourceType;
use crate::types::{DbId, Timestamp};

/// Boxed error produced by a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error(
        "{resource_type} {resource_id} is locked by user {holder_user_id} until {expires_at}"
    )]
    LockHeldByAnotherUser {
        resource_type: ResourceType,
        resource_id: DbId,
        holder_user_id: DbId,
        expires_at: Timestamp,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[source] BoxError),
}

impl CoreError {
    /// Wrap a backend error (database driver, I/O) as [`CoreError::Storage`].
    pub fn storage(err: impl Into<BoxError>) -> Self {
        Self::Storage(err.into())
    }
}

/// Convenience alias for results carrying a [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
