//! Remote store error types.

use thiserror::Error;

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("remote operation timed out: {0}")]
    Timeout(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

impl RemoteError {
    /// True when the failure says nothing about the request itself: the
    /// remote could not be reached, or did not answer in time.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode() && !e.is_status() && !e.is_builder(),
            Self::Timeout(_) => true,
            Self::Status { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
