//! Local cache error types.

use thiserror::Error;

/// Result type for local cache operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the local cache. There is no fallback below this layer, so
/// callers treat these as fatal to the current operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
