//! User-visible notices.

use std::fmt;
use tasksync_types::LocalId;

/// Kind of record a push item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Task,
    Tag,
    Link,
    Delete,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Tag => "tag",
            Self::Link => "tag assignment",
            Self::Delete => "remote delete",
        })
    }
}

/// Something the presentation layer should tell the user. Sent on the
/// engine's notice channel, if one is attached, in addition to being
/// reflected in operation results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Load could not reach the remote data and showed the local cache.
    LoadFellBack { reason: String },
    /// One push item failed; the rest of the push carried on.
    PushFailed {
        kind: RecordKind,
        record: String,
        error: String,
    },
    /// A task's remote document was deleted elsewhere.
    DocumentVanished { task_id: LocalId },
    /// A mutation failed and its in-memory change was reverted.
    OperationFailed {
        operation: &'static str,
        error: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFellBack { reason } => {
                write!(f, "Could not load from the server, showing saved data: {reason}")
            }
            Self::PushFailed {
                kind,
                record,
                error,
            } => write!(f, "Failed to sync {kind} {record}: {error}"),
            Self::DocumentVanished { task_id } => {
                write!(f, "Task {task_id} no longer exists on the server")
            }
            Self::OperationFailed { operation, error } => {
                write!(f, "Failed to {operation}: {error}")
            }
        }
    }
}
