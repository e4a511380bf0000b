//! Push: reconcile locally-originated work into the remote store.
//!
//! Order: queued remote deletes, tags, tasks, then tag links. Tags and
//! tasks go before links because a link can only be written once both of
//! its endpoints have a remote identity. Every item is pushed on its own:
//! a failure is recorded and the push moves on, and nothing already pushed
//! is rolled back. Only local-store failures abort the push.

use super::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::notice::{Notice, RecordKind};
use std::collections::{BTreeMap, BTreeSet};
use tasksync_types::translate::fields;
use tasksync_types::{Collection, CollectionPath, FieldValue, RemoteId, Tag, Task, TaskTagLink};
use tracing::{debug, info, warn};

/// One push item that did not make it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushFailure {
    pub kind: RecordKind,
    /// Local id of the record, or the remote path for deletes and links.
    pub record: String,
    pub error: String,
}

/// What a push did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    /// The probe said offline; nothing was attempted.
    pub skipped_offline: bool,
    pub deletes: usize,
    pub tags_added: usize,
    pub tags_merged: usize,
    pub tasks_added: usize,
    pub tasks_merged: usize,
    pub links_written: usize,
    pub failures: Vec<PushFailure>,
}

impl PushReport {
    pub fn succeeded(&self) -> usize {
        self.deletes
            + self.tags_added
            + self.tags_merged
            + self.tasks_added
            + self.tasks_merged
            + self.links_written
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Pushed {
    Added,
    Merged,
}

/// `TagIds` array value for a task document.
pub(super) fn tag_ids_value<'a>(ids: impl IntoIterator<Item = &'a RemoteId>) -> FieldValue {
    FieldValue::array(ids.into_iter().map(|id| FieldValue::from(id.as_str())))
}

impl SyncEngine {
    /// Pushes pending work if the probe says online.
    pub async fn push(&self) -> SyncResult<PushReport> {
        let _guard = self.lock().await;
        if !self.probe_connectivity().await.is_online() {
            debug!(tenant = %self.session.tenant(), "offline, push skipped");
            return Ok(PushReport {
                skipped_offline: true,
                ..PushReport::default()
            });
        }
        self.push_locked().await
    }

    /// Push body. The caller holds the tenant lock and has decided it is online.
    pub(super) async fn push_locked(&self) -> SyncResult<PushReport> {
        let mut report = PushReport::default();

        self.push_deletes(&mut report).await?;
        self.push_tags(&mut report).await?;
        self.push_tasks(&mut report).await?;
        self.push_links(&mut report).await?;

        info!(
            tenant = %self.session.tenant(),
            succeeded = report.succeeded(),
            tasks_added = report.tasks_added,
            tasks_merged = report.tasks_merged,
            tags_added = report.tags_added,
            links = report.links_written,
            deletes = report.deletes,
            failed = report.failures.len(),
            "push finished"
        );
        Ok(report)
    }

    fn record_failure(
        &self,
        report: &mut PushReport,
        kind: RecordKind,
        record: String,
        err: SyncError,
    ) -> SyncResult<()> {
        if err.is_fatal() {
            return Err(err);
        }
        warn!(%kind, record = %record, error = %err, "push item failed");
        let error = err.to_string();
        self.notify(Notice::PushFailed {
            kind,
            record: record.clone(),
            error: error.clone(),
        });
        report.failures.push(PushFailure {
            kind,
            record,
            error,
        });
        Ok(())
    }

    // ── Deletes ──

    async fn push_deletes(&self, report: &mut PushReport) -> SyncResult<()> {
        let queued = self.local_call(|store| store.pending_remote_deletes()).await?;
        for (collection, id) in queued {
            let path = self.session.path(collection);
            let result = self
                .remote_call("delete document", self.remote.delete(&path, &id))
                .await;
            match result {
                Ok(()) => {
                    let cleared = id.clone();
                    self.local_call(move |store| store.clear_remote_delete(collection, &cleared))
                        .await?;
                    debug!(path = %path, remote_id = %id, "pushed delete");
                    report.deletes += 1;
                }
                Err(e) => {
                    self.record_failure(report, RecordKind::Delete, format!("{path}/{id}"), e)?
                }
            }
        }
        Ok(())
    }

    // ── Tags ──

    async fn push_tags(&self, report: &mut PushReport) -> SyncResult<()> {
        let pending = self.local_call(|store| store.get_pending_sync_tags()).await?;
        let path = self.session.path(Collection::Tags);
        for tag in pending {
            let record = tag.identity.local().to_string();
            match self.push_tag(&path, tag).await {
                Ok(Pushed::Added) => report.tags_added += 1,
                Ok(Pushed::Merged) => report.tags_merged += 1,
                Err(e) => self.record_failure(report, RecordKind::Tag, record, e)?,
            }
        }
        Ok(())
    }

    async fn push_tag(&self, path: &CollectionPath, mut tag: Tag) -> SyncResult<Pushed> {
        let fields = tag.to_fields();
        let pushed = match tag.remote_id().cloned() {
            None => {
                let id = self
                    .remote_call("add tag", self.remote.add(path, &fields))
                    .await?;
                tag.identity.resolve(id)?;
                Pushed::Added
            }
            Some(id) => {
                self.remote_call("merge tag", self.remote.set_merge(path, &id, &fields))
                    .await?;
                tag.identity.mark_synced();
                Pushed::Merged
            }
        };
        debug!(tag_id = %tag.identity.local(), remote_id = ?tag.remote_id(), "pushed tag");
        self.local_call(move |store| store.update_tag(&tag)).await?;
        Ok(pushed)
    }

    // ── Tasks ──

    async fn push_tasks(&self, report: &mut PushReport) -> SyncResult<()> {
        let pending = self.local_call(|store| store.get_pending_sync_tasks()).await?;
        let path = self.session.path(Collection::Tasks);
        for task in pending {
            let record = task.identity.local().to_string();
            match self.push_task(&path, task).await {
                Ok(Pushed::Added) => report.tasks_added += 1,
                Ok(Pushed::Merged) => report.tasks_merged += 1,
                Err(e) => self.record_failure(report, RecordKind::Task, record, e)?,
            }
        }
        Ok(())
    }

    /// Adds a pending task or merges an offline edit. The remote id is
    /// persisted right after the add, which is what takes the row out of
    /// the pending set.
    async fn push_task(&self, path: &CollectionPath, mut task: Task) -> SyncResult<Pushed> {
        let fields = task.to_fields();
        let pushed = match task.remote_id().cloned() {
            None => {
                let id = self
                    .remote_call("add task", self.remote.add(path, &fields))
                    .await?;
                task.identity.resolve(id)?;
                Pushed::Added
            }
            Some(id) => {
                self.remote_call("merge task", self.remote.set_merge(path, &id, &fields))
                    .await?;
                task.identity.mark_synced();
                Pushed::Merged
            }
        };
        debug!(task_id = %task.identity.local(), remote_id = ?task.remote_id(), "pushed task");
        self.local_call(move |store| store.update_task(&task)).await?;
        Ok(pushed)
    }

    // ── Links ──

    async fn push_links(&self, report: &mut PushReport) -> SyncResult<()> {
        let unsynced = self.local_call(|store| store.get_unsynced_links()).await?;
        let mut by_task: BTreeMap<RemoteId, Vec<TaskTagLink>> = BTreeMap::new();
        for link in unsynced {
            by_task.entry(link.task_id.clone()).or_default().push(link);
        }

        for (task_id, links) in by_task {
            // The task document's TagIds must carry the links before the
            // link documents are marked synced; the next pull rebuilds
            // synced links from it.
            if let Err(e) = self.write_task_tag_ids(&task_id).await {
                self.record_failure(report, RecordKind::Link, task_id.to_string(), e)?;
                continue;
            }
            for link in links {
                let record = link.document_id().to_string();
                match self.push_link(link).await {
                    Ok(()) => report.links_written += 1,
                    Err(e) => self.record_failure(report, RecordKind::Link, record, e)?,
                }
            }
        }
        Ok(())
    }

    /// Writes the task's full local tag set to its `TagIds` field. Fails
    /// with `NotFound` if the task document was deleted elsewhere.
    pub(super) async fn write_task_tag_ids(&self, task_id: &RemoteId) -> SyncResult<()> {
        let lookup = task_id.clone();
        let tag_ids: BTreeSet<RemoteId> = self
            .local_call(move |store| store.get_task_tags(&lookup))
            .await?
            .into_iter()
            .map(|link| link.tag_id)
            .collect();
        let path = self.session.path(Collection::Tasks);
        self.remote_call(
            "update task tags",
            self.remote
                .update_field(&path, task_id, fields::TAG_IDS, tag_ids_value(&tag_ids)),
        )
        .await
    }

    async fn push_link(&self, link: TaskTagLink) -> SyncResult<()> {
        let path = self.session.path(Collection::TaskTags);
        self.remote_call(
            "write tag link",
            self.remote
                .set_merge(&path, &link.document_id(), &link.to_fields()),
        )
        .await?;
        self.local_call(move |store| store.mark_link_synced(&link))
            .await
    }
}
