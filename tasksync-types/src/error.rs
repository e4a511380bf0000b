//! Error types for domain invariants.

use thiserror::Error;

/// Result type for operations on domain types.
pub type TypesResult<T> = Result<T, TypesError>;

/// Violations of the domain invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("record already has remote id {existing}, refusing to reassign to {attempted}")]
    IdentityConflict { existing: String, attempted: String },

    #[error("remote id must not be empty")]
    EmptyRemoteId,

    #[error("tenant id must not be empty")]
    EmptyTenant,

    #[error("tenant id {0:?} is not a single path segment")]
    InvalidTenant(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
