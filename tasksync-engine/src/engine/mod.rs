//! The sync engine: load, push, mutations, and search over one tenant's data.
//!
//! Every top-level operation takes the tenant's lock from [`TenantLocks`],
//! asks the probe once whether it is online, and then follows the online or
//! offline path for its whole run. Remote calls are bounded by the
//! configured deadline. Local-store calls run on the blocking pool with a
//! connection scoped to that call.

mod load;
mod mutations;
mod push;
mod search;

pub use load::{LoadOutcome, LoadSource};
pub use push::{PushFailure, PushReport};

use crate::config::EngineConfig;
use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::locks::TenantLocks;
use crate::notice::Notice;
use crate::session::Session;
use std::future::Future;
use std::sync::Arc;
use tasksync_remote::{ConnectivityProbe, RemoteError, RemoteResult, RemoteStore};
use tasksync_storage::{LocalStore, StorageResult};
use tasksync_types::{Tag, Task};
use tokio::sync::{OwnedMutexGuard, RwLock, mpsc};
use tracing::{debug, warn};

/// The in-memory working set the presentation layer renders.
#[derive(Debug)]
struct WorkingSet {
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    connectivity: Connectivity,
}

/// Orchestrates the local cache and the remote store for one tenant.
pub struct SyncEngine {
    session: Session,
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    probe: Arc<dyn ConnectivityProbe>,
    locks: TenantLocks,
    config: EngineConfig,
    notices: Option<mpsc::Sender<Notice>>,
    state: RwLock<WorkingSet>,
}

impl SyncEngine {
    /// Builds an engine for `session`. The cache handle is rebound to the
    /// session's tenant, so the engine never reads or writes another
    /// tenant's rows even when handed a handle opened for someone else.
    pub fn new(
        session: Session,
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
        locks: TenantLocks,
        config: EngineConfig,
    ) -> Self {
        let local = if local.tenant() == session.tenant() {
            local
        } else {
            debug!(
                from = %local.tenant(),
                to = %session.tenant(),
                "rebinding cache handle to session tenant"
            );
            local.for_tenant(session.tenant().clone())
        };
        Self {
            session,
            local,
            remote,
            probe,
            locks,
            config,
            notices: None,
            state: RwLock::new(WorkingSet {
                tasks: Vec::new(),
                tags: Vec::new(),
                connectivity: Connectivity::Offline,
            }),
        }
    }

    /// Opens a notice channel sized from the config and returns its
    /// receiving end. Replaces any previous channel.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Notice> {
        let (tx, rx) = mpsc::channel(self.config.notice_capacity.max(1));
        self.notices = Some(tx);
        rx
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the tasks in the working set.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn tags(&self) -> Vec<Tag> {
        self.state.read().await.tags.clone()
    }

    /// Connectivity as decided by the most recent operation.
    pub async fn connectivity(&self) -> Connectivity {
        self.state.read().await.connectivity
    }

    // ── Plumbing shared by the operation modules ──

    async fn lock(&self) -> OwnedMutexGuard<()> {
        self.locks.acquire(self.session.tenant()).await
    }

    async fn probe_connectivity(&self) -> Connectivity {
        let connectivity = Connectivity::from_probe(self.probe.is_online().await);
        debug!(tenant = %self.session.tenant(), ?connectivity, "probed connectivity");
        self.state.write().await.connectivity = connectivity;
        connectivity
    }

    async fn set_connectivity(&self, connectivity: Connectivity) {
        self.state.write().await.connectivity = connectivity;
    }

    /// Runs a remote call under the configured deadline.
    async fn remote_call<T>(
        &self,
        operation: &str,
        call: impl Future<Output = RemoteResult<T>>,
    ) -> SyncResult<T> {
        let deadline = self.config.remote_deadline();
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RemoteError::Timeout(format!(
                "{operation} after {} ms",
                deadline.as_millis()
            ))
            .into()),
        }
    }

    /// Runs a local-store call on the blocking pool.
    async fn local_call<T, F>(&self, call: F) -> SyncResult<T>
    where
        F: FnOnce(&LocalStore) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.local.clone();
        Ok(tokio::task::spawn_blocking(move || call(&store)).await??)
    }

    fn notify(&self, notice: Notice) {
        let Some(tx) = &self.notices else {
            return;
        };
        if let Err(e) = tx.try_send(notice) {
            warn!(error = %e, "dropped notice");
        }
    }

    /// Reports a failed mutation and hands the error back.
    fn fail(&self, operation: &'static str, err: SyncError) -> SyncError {
        warn!(operation, error = %err, "operation failed");
        self.notify(Notice::OperationFailed {
            operation,
            error: err.to_string(),
        });
        err
    }
}
