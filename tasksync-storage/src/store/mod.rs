//! Local cache store, split into per-table operation modules.

pub(crate) mod helpers;
mod links;
mod mirror;
mod tags;
mod tasks;

pub use mirror::MirrorStats;

use crate::error::StorageResult;
use crate::schema::initialize_schema;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tasksync_types::TenantId;

/// Handle to one tenant's rows in the on-device cache.
///
/// Holds only the database path and the tenant. Every operation opens its
/// own connection and closes it before returning, so handles can be cloned
/// freely and moved onto blocking threads. Every read and write is limited
/// to the handle's tenant.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    tenant: TenantId,
}

/// Row counts, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCounts {
    pub tasks: usize,
    pub tags: usize,
    pub links: usize,
    pub pending_deletes: usize,
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl LocalStore {
    /// Opens (or creates) the cache at `path` for `tenant` and makes sure
    /// the schema exists.
    pub fn open(path: impl AsRef<Path>, tenant: TenantId) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path, tenant };
        let conn = store.connect()?;
        initialize_schema(&conn)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Handle on the same cache file for another tenant.
    pub fn for_tenant(&self, tenant: TenantId) -> Self {
        Self {
            path: self.path.clone(),
            tenant,
        }
    }

    pub(crate) fn tenant_key(&self) -> &str {
        self.tenant.as_str()
    }

    /// Opens a connection scoped to one operation.
    pub(crate) fn connect(&self) -> StorageResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Row counts for this handle's tenant.
    pub fn counts(&self) -> StorageResult<StoreCounts> {
        let conn = self.connect()?;
        let count = |table: &str| -> StorageResult<usize> {
            let n: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE Tenant = ?"),
                [self.tenant_key()],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };
        Ok(StoreCounts {
            tasks: count("Tasks")?,
            tags: count("Tags")?,
            links: count("TasksTag")?,
            pending_deletes: count("PendingDeletes")?,
        })
    }
}
