//! Load: populate the working set from the remote store or the cache.

use super::SyncEngine;
use super::push::PushReport;
use crate::connectivity::Connectivity;
use crate::error::SyncResult;
use crate::notice::Notice;
use chrono::Utc;
use tasksync_storage::MirrorStats;
use tasksync_types::{Collection, Tag, Task};
use tracing::{info, warn};

/// Where the working set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Freshly pulled and mirrored.
    Remote,
    /// Read from the local cache only.
    Local,
}

/// Result of one load, reported once.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub source: LoadSource,
    pub tasks: Vec<Task>,
    pub tags: Vec<Tag>,
    /// The push run after mirroring. `None` on the offline path.
    pub push: Option<PushReport>,
    /// Why the online path was abandoned, if it was.
    pub fallback: Option<String>,
}

impl SyncEngine {
    /// Loads the tenant's tasks and tags.
    ///
    /// Online: pull both collections, mirror them into the cache (pending
    /// and modified rows survive), push pending work, then read the working
    /// set back from the cache. If the pull fails the engine reports it,
    /// degrades to offline, and reads the cache instead. A cache failure
    /// while mirroring ends the load with the storage error.
    ///
    /// Offline: read the cache, no remote calls.
    pub async fn load(&self) -> SyncResult<LoadOutcome> {
        let _guard = self.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> SyncResult<LoadOutcome> {
        let mut connectivity = self.probe_connectivity().await;
        let mut source = LoadSource::Local;
        let mut push = None;
        let mut fallback = None;

        if connectivity.is_online() {
            match self.pull_and_mirror().await {
                Ok(_) => {
                    source = LoadSource::Remote;
                    push = Some(self.push_locked().await?);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(tenant = %self.session.tenant(), error = %e, "load fell back to local cache");
                    connectivity.degrade();
                    self.set_connectivity(connectivity).await;
                    self.notify(Notice::LoadFellBack {
                        reason: e.to_string(),
                    });
                    fallback = Some(e.to_string());
                }
            }
        }

        let (tasks, tags) = self
            .local_call(|store| Ok((store.get_tasks()?, store.get_tags()?)))
            .await?;

        {
            let mut state = self.state.write().await;
            state.tasks = tasks.clone();
            state.tags = tags.clone();
        }

        info!(
            tenant = %self.session.tenant(),
            source = ?source,
            tasks = tasks.len(),
            tags = tags.len(),
            online = connectivity == Connectivity::Online,
            "loaded working set"
        );

        Ok(LoadOutcome {
            source,
            tasks,
            tags,
            push,
            fallback,
        })
    }

    async fn pull_and_mirror(&self) -> SyncResult<MirrorStats> {
        let tasks_path = self.session.path(Collection::Tasks);
        let tags_path = self.session.path(Collection::Tags);

        let task_docs = self
            .remote_call("list tasks", self.remote.list(&tasks_path))
            .await?;
        let tag_docs = self
            .remote_call("list tags", self.remote.list(&tags_path))
            .await?;

        let now = Utc::now();
        let tasks: Vec<Task> = task_docs
            .iter()
            .map(|doc| Task::from_document(doc, now))
            .collect();
        let tags: Vec<Tag> = tag_docs.iter().map(Tag::from_document).collect();

        info!(
            tenant = %self.session.tenant(),
            tasks = tasks.len(),
            tags = tags.len(),
            "pulled remote collections"
        );

        self.local_call(move |store| store.replace_mirror(&tasks, &tags))
            .await
    }
}
