//! The signed-in tenant and its persisted form.

use crate::error::SyncResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tasksync_types::{Collection, CollectionPath, TenantId};
use tracing::info;

/// The tenant every store operation of one engine is scoped to. Fixed for
/// the engine's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    tenant: TenantId,
}

impl Session {
    pub fn new(tenant: TenantId) -> Self {
        Self { tenant }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn path(&self, collection: Collection) -> CollectionPath {
        CollectionPath::new(&self.tenant, collection)
    }
}

#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(rename = "UserId")]
    user_id: String,
}

/// `{"UserId": "..."}` file remembering who is signed in.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved session, or `None` when nobody is signed in or the saved
    /// id is not a valid tenant.
    pub fn load(&self) -> SyncResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let record: SessionRecord = serde_json::from_str(&raw)?;
        Ok(TenantId::new(record.user_id).ok().map(Session::new))
    }

    pub fn save(&self, session: &Session) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let record = SessionRecord {
            user_id: session.tenant().to_string(),
        };
        std::fs::write(&self.path, serde_json::to_string(&record)?)?;
        info!(tenant = %session.tenant(), "saved session");
        Ok(())
    }

    /// Logs out by removing the file. Succeeds when there was no file.
    pub fn clear(&self) -> SyncResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("cleared session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
