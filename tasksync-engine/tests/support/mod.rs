//! Shared test helpers: an in-memory remote store with fault injection and
//! an engine harness over a temporary SQLite cache.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasksync_engine::{EngineConfig, Notice, Session, SyncEngine, TenantLocks};
use tasksync_remote::{ManualProbe, RemoteError, RemoteResult, RemoteStore};
use tasksync_storage::LocalStore;
use tasksync_types::{
    Collection, CollectionPath, FieldMap, FieldValue, RemoteDocument, RemoteId, TenantId,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const TENANT: &str = "u1";

pub fn tenant() -> TenantId {
    TenantId::new(TENANT).unwrap()
}

pub fn path(collection: Collection) -> CollectionPath {
    CollectionPath::new(&tenant(), collection)
}

// ── Fake remote ─────────────────────────────────────────────────

/// Call counters, one per remote operation.
#[derive(Default)]
pub struct Calls {
    pub list: AtomicUsize,
    pub get: AtomicUsize,
    pub add: AtomicUsize,
    pub set_merge: AtomicUsize,
    pub update_field: AtomicUsize,
    pub delete: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        [
            &self.list,
            &self.get,
            &self.add,
            &self.set_merge,
            &self.update_field,
            &self.delete,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

/// In-memory remote store keyed by collection path then document id.
#[derive(Default)]
pub struct FakeRemote {
    docs: Mutex<HashMap<String, BTreeMap<RemoteId, FieldMap>>>,
    next_id: AtomicUsize,
    pub calls: Calls,
    /// Every call fails as unreachable.
    pub unreachable: AtomicBool,
    /// `list` fails with a permission error.
    pub fail_lists: AtomicBool,
    /// `add` fails for documents with one of these titles.
    pub fail_add_titles: Mutex<HashSet<String>>,
    /// Delay applied to `list`, for overlapping-operation tests.
    pub list_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, collection: Collection, id: &str, fields: FieldMap) {
        self.seed_at(&path(collection), id, fields);
    }

    pub fn seed_at(&self, path: &CollectionPath, id: &str, fields: FieldMap) {
        self.docs
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .insert(RemoteId::new(id), fields);
    }

    /// Deletes a document behind the engine's back, as another client would.
    pub fn remove(&self, collection: Collection, id: &RemoteId) {
        if let Some(docs) = self
            .docs
            .lock()
            .unwrap()
            .get_mut(&path(collection).to_string())
        {
            docs.remove(id);
        }
    }

    pub fn doc(&self, collection: Collection, id: &RemoteId) -> Option<FieldMap> {
        self.docs
            .lock()
            .unwrap()
            .get(&path(collection).to_string())
            .and_then(|docs| docs.get(id).cloned())
    }

    pub fn ids(&self, collection: Collection) -> Vec<RemoteId> {
        self.docs
            .lock()
            .unwrap()
            .get(&path(collection).to_string())
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.ids(collection).len()
    }

    /// Number of documents at an arbitrary path, for other tenants.
    pub fn count_at(&self, path: &CollectionPath) -> usize {
        self.docs
            .lock()
            .unwrap()
            .get(&path.to_string())
            .map_or(0, BTreeMap::len)
    }

    fn gate(&self) -> RemoteResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Timeout("fake remote unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn list(&self, path: &CollectionPath) -> RemoteResult<Vec<RemoteDocument>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.gate()?;
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(RemoteError::PermissionDenied(path.to_string()));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&path.to_string())
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| RemoteDocument::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
    ) -> RemoteResult<Option<RemoteDocument>> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&path.to_string())
            .and_then(|docs| docs.get(id))
            .map(|fields| RemoteDocument::new(id.clone(), fields.clone())))
    }

    async fn add(&self, path: &CollectionPath, fields: &FieldMap) -> RemoteResult<RemoteId> {
        self.calls.add.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        let title = fields.get("Title").and_then(FieldValue::as_str);
        if let Some(title) = title {
            if self.fail_add_titles.lock().unwrap().contains(title) {
                return Err(RemoteError::Status {
                    status: 500,
                    message: format!("rejected {title}"),
                });
            }
        }
        let id = RemoteId::new(format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
        self.docs
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn set_merge(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        fields: &FieldMap,
    ) -> RemoteResult<()> {
        self.calls.set_merge.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .entry(path.to_string())
            .or_default()
            .entry(id.clone())
            .or_default();
        for (name, value) in fields {
            doc.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    async fn update_field(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        field: &str,
        value: FieldValue,
    ) -> RemoteResult<()> {
        self.calls.update_field.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        let mut docs = self.docs.lock().unwrap();
        match docs.get_mut(&path.to_string()).and_then(|d| d.get_mut(id)) {
            Some(doc) => {
                doc.insert(field.to_string(), value);
                Ok(())
            }
            None => Err(RemoteError::NotFound(format!("{path}/{id}"))),
        }
    }

    async fn delete(&self, path: &CollectionPath, id: &RemoteId) -> RemoteResult<()> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        self.gate()?;
        if let Some(docs) = self.docs.lock().unwrap().get_mut(&path.to_string()) {
            docs.remove(id);
        }
        Ok(())
    }
}

// ── Documents ───────────────────────────────────────────────────

pub fn task_fields(title: &str, tags: &[&str]) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("Title".into(), title.into());
    fields.insert("Description".into(), "".into());
    fields.insert("IsDone".into(), false.into());
    fields.insert(
        "TagIds".into(),
        FieldValue::array(tags.iter().map(|t| FieldValue::from(*t))),
    );
    fields
}

pub fn tag_fields(name: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert("Name".into(), name.into());
    fields
}

// ── Engine harness ──────────────────────────────────────────────

pub struct Harness {
    pub dir: TempDir,
    pub local: LocalStore,
    pub remote: Arc<FakeRemote>,
    pub probe: Arc<ManualProbe>,
    pub locks: TenantLocks,
    pub engine: SyncEngine,
    pub notices: mpsc::Receiver<Notice>,
}

impl Harness {
    pub fn new(online: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let local = LocalStore::open(dir.path().join("TaskBase.db"), tenant()).unwrap();
        Self::with_store(dir, local, FakeRemote::new(), online, TenantLocks::new())
    }

    pub fn with_store(
        dir: TempDir,
        local: LocalStore,
        remote: Arc<FakeRemote>,
        online: bool,
        locks: TenantLocks,
    ) -> Self {
        Self::for_tenant(dir, local, remote, online, locks, tenant())
    }

    /// Engine for `tenant` over an existing cache and remote.
    pub fn for_tenant(
        dir: TempDir,
        local: LocalStore,
        remote: Arc<FakeRemote>,
        online: bool,
        locks: TenantLocks,
        tenant: TenantId,
    ) -> Self {
        Self::assemble(dir, local, remote, online, locks, tenant, 2_000)
    }

    /// Fresh cache with a custom per-call remote deadline.
    pub fn with_deadline(online: bool, deadline_ms: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let local = LocalStore::open(dir.path().join("TaskBase.db"), tenant()).unwrap();
        Self::assemble(
            dir,
            local,
            FakeRemote::new(),
            online,
            TenantLocks::new(),
            tenant(),
            deadline_ms,
        )
    }

    fn assemble(
        dir: TempDir,
        local: LocalStore,
        remote: Arc<FakeRemote>,
        online: bool,
        locks: TenantLocks,
        tenant: TenantId,
        deadline_ms: u64,
    ) -> Self {
        let probe = Arc::new(ManualProbe::new(online));
        let config = EngineConfig {
            database_path: local.path().to_path_buf(),
            remote_deadline_ms: deadline_ms,
            ..EngineConfig::default()
        };
        let mut engine = SyncEngine::new(
            Session::new(tenant),
            local.clone(),
            remote.clone(),
            probe.clone(),
            locks.clone(),
            config,
        );
        let notices = engine.subscribe();
        Self {
            dir,
            local,
            remote,
            probe,
            locks,
            engine,
            notices,
        }
    }

    pub fn set_online(&self, online: bool) {
        self.probe.set_online(online);
    }

    /// Notices received so far.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            out.push(notice);
        }
        out
    }
}
