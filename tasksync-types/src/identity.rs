//! Dual local/remote identity and the per-record sync state machine.

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Key of a record in the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Generates a fresh, time-ordered local key for a record created on this device.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&RemoteId> for LocalId {
    fn from(remote: &RemoteId) -> Self {
        Self(remote.0.clone())
    }
}

/// Server-assigned document key in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Interprets a stored value, treating `None` and the empty-string
    /// sentinel as "no remote identity".
    pub fn non_empty(raw: Option<String>) -> Option<Self> {
        raw.filter(|s| !s.trim().is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a record stands relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Exists only locally; must be added to the remote store.
    Pending,
    /// Known to the remote store, but carries local edits not yet pushed.
    Modified,
    /// Mirror of the remote document.
    Synced,
}

/// Identity of a record across both stores.
///
/// The local key always exists. The remote key is absent until the record
/// is first accepted by the remote store; [`Identity::resolve`] is the only
/// way to set it and refuses to change it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    local: LocalId,
    remote: Option<RemoteId>,
    modified: bool,
}

impl Identity {
    /// Identity for a record created locally that has not reached the remote store.
    pub fn pending() -> Self {
        Self {
            local: LocalId::generate(),
            remote: None,
            modified: false,
        }
    }

    /// Identity for a record that came from the remote store. Both keys are
    /// the remote document id, so the record is never pending.
    pub fn from_remote(remote: RemoteId) -> Self {
        Self {
            local: LocalId::from(&remote),
            remote: Some(remote),
            modified: false,
        }
    }

    /// Rebuilds an identity from persisted columns.
    pub fn restore(local: LocalId, remote: Option<RemoteId>, modified: bool) -> Self {
        let remote = remote.filter(|r| !r.is_empty());
        let modified = modified && remote.is_some();
        Self {
            local,
            remote,
            modified,
        }
    }

    pub fn local(&self) -> &LocalId {
        &self.local
    }

    pub fn remote(&self) -> Option<&RemoteId> {
        self.remote.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.remote.is_none()
    }

    /// True when the record needs a push: pending, or modified while offline.
    pub fn needs_push(&self) -> bool {
        self.state() != SyncState::Synced
    }

    pub fn state(&self) -> SyncState {
        match (&self.remote, self.modified) {
            (None, _) => SyncState::Pending,
            (Some(_), true) => SyncState::Modified,
            (Some(_), false) => SyncState::Synced,
        }
    }

    /// Pending -> Synced. Assigns the remote key exactly once.
    ///
    /// Resolving again to the same key is a no-op; resolving to a different
    /// key is an [`TypesError::IdentityConflict`].
    pub fn resolve(&mut self, remote: RemoteId) -> TypesResult<()> {
        if remote.is_empty() {
            return Err(TypesError::EmptyRemoteId);
        }
        match &self.remote {
            None => {
                self.remote = Some(remote);
                self.modified = false;
                Ok(())
            }
            Some(existing) if *existing == remote => Ok(()),
            Some(existing) => Err(TypesError::IdentityConflict {
                existing: existing.to_string(),
                attempted: remote.to_string(),
            }),
        }
    }

    /// Synced -> Modified. A pending record stays pending: its first push
    /// is an add and carries every field anyway.
    pub fn mark_modified(&mut self) {
        if self.remote.is_some() {
            self.modified = true;
        }
    }

    /// Modified -> Synced, after the local edits reached the remote store.
    pub fn mark_synced(&mut self) {
        self.modified = false;
    }
}
