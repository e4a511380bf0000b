//! Tasks, tags, and the links between them.

use crate::error::{TypesError, TypesResult};
use crate::identity::{Identity, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub identity: Identity,
    pub title: String,
    pub description: String,
    pub is_complete: bool,
    /// Set once at creation.
    pub created_at: DateTime<Utc>,
    /// Tags attached to this task, in remote-id space.
    pub tag_ids: BTreeSet<RemoteId>,
}

impl Task {
    /// Creates a new, pending task. The title must not be blank.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> TypesResult<Self> {
        let title = title.into();
        validate_title(&title)?;
        Ok(Self {
            identity: Identity::pending(),
            title,
            description: description.into(),
            is_complete: false,
            created_at: Utc::now(),
            tag_ids: BTreeSet::new(),
        })
    }

    /// Replaces title and description, keeping the non-empty title invariant.
    pub fn edit(&mut self, title: impl Into<String>, description: impl Into<String>) -> TypesResult<()> {
        let title = title.into();
        validate_title(&title)?;
        self.title = title;
        self.description = description.into();
        Ok(())
    }

    /// Remote key, if this task has one.
    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.identity.remote()
    }

    pub fn is_pending(&self) -> bool {
        self.identity.is_pending()
    }

    /// Adds a tag. Returns false if it was already attached.
    pub fn attach_tag(&mut self, tag: RemoteId) -> bool {
        self.tag_ids.insert(tag)
    }

    pub fn has_tag(&self, tag: &RemoteId) -> bool {
        self.tag_ids.contains(tag)
    }

    /// Case-insensitive title prefix match.
    pub fn title_starts_with(&self, query: &str) -> bool {
        self.title.to_lowercase().starts_with(&query.to_lowercase())
    }
}

/// Checks the non-empty title invariant.
fn validate_title(title: &str) -> TypesResult<()> {
    if title.trim().is_empty() {
        return Err(TypesError::InvalidInput("task title must not be empty".into()));
    }
    Ok(())
}

/// A label that can be attached to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub identity: Identity,
    pub name: String,
}

impl Tag {
    /// Creates a new, pending tag. The name must not be blank.
    pub fn new(name: impl Into<String>) -> TypesResult<Self> {
        let name = name.into();
        validate_tag_name(&name)?;
        Ok(Self {
            identity: Identity::pending(),
            name,
        })
    }

    pub fn remote_id(&self) -> Option<&RemoteId> {
        self.identity.remote()
    }

    pub fn rename(&mut self, name: impl Into<String>) -> TypesResult<()> {
        let name = name.into();
        validate_tag_name(&name)?;
        self.name = name;
        Ok(())
    }
}

fn validate_tag_name(name: &str) -> TypesResult<()> {
    if name.trim().is_empty() {
        return Err(TypesError::InvalidInput("tag name must not be empty".into()));
    }
    Ok(())
}

/// Task/tag association, stored in remote-id space. Both endpoints must
/// already have a remote identity before a link can exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskTagLink {
    pub task_id: RemoteId,
    pub tag_id: RemoteId,
    /// Whether the link document exists remotely.
    pub synced: bool,
}

impl TaskTagLink {
    pub fn new(task_id: RemoteId, tag_id: RemoteId) -> Self {
        Self {
            task_id,
            tag_id,
            synced: false,
        }
    }

    /// Deterministic document id, so writing the same pair twice targets the
    /// same remote document.
    pub fn document_id(&self) -> RemoteId {
        RemoteId::new(format!("{}_{}", self.task_id, self.tag_id))
    }
}
