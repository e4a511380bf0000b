//! Sync engine error types.

use tasksync_remote::RemoteError;
use tasksync_storage::StorageError;
use tasksync_types::TypesError;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("local store error: {0}")]
    Storage(#[from] StorageError),

    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Types(#[from] TypesError),

    #[error("document {0} no longer exists in the remote store")]
    DocumentVanished(String),

    #[error("{0} has not been synced to the remote store yet")]
    NotSynced(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SyncError {
    /// Local-store failures end the current operation; there is no
    /// fallback below the cache.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Task(_))
    }

    /// True when the remote could not be reached or did not answer in time.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_connectivity())
    }
}
