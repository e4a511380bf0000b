//! Mutating operations.
//!
//! Online, the remote store is written first and the result mirrored into
//! the cache. Offline, only the cache is written: new records stay pending,
//! and edits of already-synced records mark them modified for the next push.
//! An online create that fails on connectivity is kept locally as pending.

use super::SyncEngine;
use super::push::tag_ids_value;
use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::notice::Notice;
use tasksync_types::translate::fields;
use tasksync_types::{Collection, FieldMap, LocalId, RemoteId, Tag, Task, TaskTagLink};
use tracing::{debug, info, warn};

impl SyncEngine {
    // ── Tasks ──

    pub async fn create_task(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> SyncResult<Task> {
        let mut task = Task::new(title, description)?;
        let _guard = self.lock().await;
        let mut connectivity = self.probe_connectivity().await;

        if connectivity.is_online() {
            let path = self.session.path(Collection::Tasks);
            let fields = task.to_fields();
            match self
                .remote_call("add task", self.remote.add(&path, &fields))
                .await
            {
                Ok(id) => task.identity.resolve(id)?,
                Err(e) if e.is_connectivity() => {
                    warn!(error = %e, "remote unreachable, keeping task as pending");
                    connectivity.degrade();
                    self.set_connectivity(connectivity).await;
                }
                Err(e) => return Err(self.fail("create task", e)),
            }
        }

        let row = task.clone();
        self.local_call(move |store| store.add_task(&row)).await?;
        self.state.write().await.tasks.push(task.clone());
        info!(task_id = %task.identity.local(), pending = task.is_pending(), "created task");
        Ok(task)
    }

    /// Replaces a task's title and description.
    pub async fn update_task(
        &self,
        id: &LocalId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> SyncResult<Task> {
        let _guard = self.lock().await;
        let connectivity = self.probe_connectivity().await;
        let mut task = self.cached_task(id).await?;
        task.edit(title, description)?;

        if let Some(remote) = task.remote_id().cloned() {
            if connectivity.is_online() {
                let mut merge = FieldMap::new();
                merge.insert(fields::TITLE.into(), task.title.as_str().into());
                merge.insert(fields::DESCRIPTION.into(), task.description.as_str().into());
                let path = self.session.path(Collection::Tasks);
                self.remote_call("update task", self.remote.set_merge(&path, &remote, &merge))
                    .await
                    .map_err(|e| self.fail("update task", e))?;
            } else {
                task.identity.mark_modified();
            }
        }

        self.save_task(&task).await?;
        debug!(task_id = %id, state = ?task.identity.state(), "updated task");
        Ok(task)
    }

    /// Sets a task's completion flag.
    ///
    /// The working set flips first so the presentation layer can reflect the
    /// toggle at once. Online, the remote document is checked before it is
    /// written; if it has vanished, or either call fails, the flag is
    /// reverted and the failure reported.
    pub async fn set_complete(&self, id: &LocalId, done: bool) -> SyncResult<Task> {
        let _guard = self.lock().await;
        let connectivity = self.probe_connectivity().await;
        let mut task = self.cached_task(id).await?;
        let previous = task.is_complete;
        self.set_working_flag(id, done).await;

        if let Some(remote) = task.remote_id().cloned() {
            if connectivity.is_online() {
                if let Err(e) = self.write_completion(&remote, done).await {
                    self.set_working_flag(id, previous).await;
                    if let SyncError::DocumentVanished(_) = e {
                        warn!(task_id = %id, remote_id = %remote, "task document vanished");
                        self.notify(Notice::DocumentVanished {
                            task_id: id.clone(),
                        });
                        return Err(e);
                    }
                    return Err(self.fail("update task", e));
                }
            } else {
                task.identity.mark_modified();
            }
        }

        task.is_complete = done;
        if let Err(e) = self.save_task(&task).await {
            self.set_working_flag(id, previous).await;
            return Err(self.fail("update task", e));
        }
        debug!(task_id = %id, done, "set completion");
        Ok(task)
    }

    async fn write_completion(&self, remote: &RemoteId, done: bool) -> SyncResult<()> {
        let path = self.session.path(Collection::Tasks);
        let vanished = || SyncError::DocumentVanished(remote.to_string());

        let existing = self
            .remote_call("get task", self.remote.get(&path, remote))
            .await?;
        if existing.is_none() {
            return Err(vanished());
        }
        match self
            .remote_call(
                "update task",
                self.remote
                    .update_field(&path, remote, fields::IS_DONE, done.into()),
            )
            .await
        {
            Err(SyncError::Remote(e)) if e.is_not_found() => Err(vanished()),
            other => other,
        }
    }

    /// Deletes a task, its link documents, its cache row, and its cache links.
    pub async fn delete_task(&self, id: &LocalId) -> SyncResult<()> {
        let _guard = self.lock().await;
        let connectivity = self.probe_connectivity().await;
        let task = self.cached_task(id).await?;
        let target = id.clone();

        match (task.remote_id(), connectivity) {
            (Some(remote), Connectivity::Online) => {
                let path = self.session.path(Collection::Tasks);
                self.remote_call("delete task", self.remote.delete(&path, remote))
                    .await
                    .map_err(|e| self.fail("delete task", e))?;
                self.delete_link_documents(&task).await?;
                self.local_call(move |store| store.delete_task(&target)).await?;
            }
            (Some(_), Connectivity::Offline) => {
                self.local_call(move |store| store.delete_task_deferred(&target))
                    .await?;
            }
            (None, _) => {
                self.local_call(move |store| store.delete_task(&target)).await?;
            }
        }

        self.state
            .write()
            .await
            .tasks
            .retain(|t| t.identity.local() != id);
        info!(task_id = %id, "deleted task");
        Ok(())
    }

    /// Deletes the remote link documents of a task. A link document that
    /// cannot be deleted now is queued for the next push.
    async fn delete_link_documents(&self, task: &Task) -> SyncResult<()> {
        let Some(task_id) = task.remote_id() else {
            return Ok(());
        };
        let path = self.session.path(Collection::TaskTags);
        for tag_id in &task.tag_ids {
            let doc = TaskTagLink::new(task_id.clone(), tag_id.clone()).document_id();
            if let Err(e) = self
                .remote_call("delete tag link", self.remote.delete(&path, &doc))
                .await
            {
                warn!(link = %doc, error = %e, "queueing link delete for next push");
                self.local_call(move |store| store.queue_remote_delete(Collection::TaskTags, &doc))
                    .await?;
            }
        }
        Ok(())
    }

    // ── Tags ──

    pub async fn create_tag(&self, name: impl Into<String>) -> SyncResult<Tag> {
        let mut tag = Tag::new(name)?;
        let _guard = self.lock().await;
        let mut connectivity = self.probe_connectivity().await;

        if connectivity.is_online() {
            let path = self.session.path(Collection::Tags);
            match self
                .remote_call("add tag", self.remote.add(&path, &tag.to_fields()))
                .await
            {
                Ok(id) => tag.identity.resolve(id)?,
                Err(e) if e.is_connectivity() => {
                    warn!(error = %e, "remote unreachable, keeping tag as pending");
                    connectivity.degrade();
                    self.set_connectivity(connectivity).await;
                }
                Err(e) => return Err(self.fail("create tag", e)),
            }
        }

        let row = tag.clone();
        self.local_call(move |store| store.add_tag(&row)).await?;
        self.state.write().await.tags.push(tag.clone());
        info!(tag_id = %tag.identity.local(), pending = tag.remote_id().is_none(), "created tag");
        Ok(tag)
    }

    pub async fn rename_tag(&self, id: &LocalId, name: impl Into<String>) -> SyncResult<Tag> {
        let _guard = self.lock().await;
        let connectivity = self.probe_connectivity().await;
        let lookup = id.clone();
        let mut tag = self
            .local_call(move |store| store.get_tag(&lookup))
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("tag {id}")))?;
        tag.rename(name)?;

        if let Some(remote) = tag.remote_id().cloned() {
            if connectivity.is_online() {
                let path = self.session.path(Collection::Tags);
                self.remote_call(
                    "rename tag",
                    self.remote.set_merge(&path, &remote, &tag.to_fields()),
                )
                .await
                .map_err(|e| self.fail("rename tag", e))?;
            } else {
                tag.identity.mark_modified();
            }
        }

        let row = tag.clone();
        self.local_call(move |store| store.update_tag(&row)).await?;
        if let Some(slot) = self
            .state
            .write()
            .await
            .tags
            .iter_mut()
            .find(|t| t.identity.local() == id)
        {
            *slot = tag.clone();
        }
        Ok(tag)
    }

    /// Attaches a tag to a task. Both must already have remote identities.
    /// Returns false when the tag was already attached.
    pub async fn assign_tag(&self, task_id: &LocalId, tag_id: &LocalId) -> SyncResult<bool> {
        let _guard = self.lock().await;
        let connectivity = self.probe_connectivity().await;
        let mut task = self.cached_task(task_id).await?;
        let lookup = tag_id.clone();
        let tag = self
            .local_call(move |store| store.get_tag(&lookup))
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("tag {tag_id}")))?;

        let task_remote = task
            .remote_id()
            .cloned()
            .ok_or_else(|| SyncError::NotSynced(format!("task {task_id}")))?;
        let tag_remote = tag
            .remote_id()
            .cloned()
            .ok_or_else(|| SyncError::NotSynced(format!("tag {tag_id}")))?;

        if !task.attach_tag(tag_remote.clone()) {
            debug!(task_id = %task_id, tag_id = %tag_id, "tag already attached");
            return Ok(false);
        }
        let mut link = TaskTagLink::new(task_remote.clone(), tag_remote);

        if connectivity.is_online() {
            let tasks_path = self.session.path(Collection::Tasks);
            let links_path = self.session.path(Collection::TaskTags);
            self.remote_call(
                "update task tags",
                self.remote.update_field(
                    &tasks_path,
                    &task_remote,
                    fields::TAG_IDS,
                    tag_ids_value(&task.tag_ids),
                ),
            )
            .await
            .map_err(|e| self.fail("assign tag", e))?;
            self.remote_call(
                "write tag link",
                self.remote
                    .set_merge(&links_path, &link.document_id(), &link.to_fields()),
            )
            .await
            .map_err(|e| self.fail("assign tag", e))?;
            link.synced = true;
        }

        let inserted = self.local_call(move |store| store.assign_tag(&link)).await?;
        if let Some(slot) = self
            .state
            .write()
            .await
            .tasks
            .iter_mut()
            .find(|t| t.identity.local() == task_id)
        {
            *slot = task;
        }
        info!(task_id = %task_id, tag_id = %tag_id, "assigned tag");
        Ok(inserted)
    }

    // ── Helpers ──

    /// Current cache row of a task.
    async fn cached_task(&self, id: &LocalId) -> SyncResult<Task> {
        let lookup = id.clone();
        self.local_call(move |store| store.get_task(&lookup))
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("task {id}")))
    }

    /// Writes a task to the cache and replaces it in the working set.
    async fn save_task(&self, task: &Task) -> SyncResult<()> {
        let row = task.clone();
        self.local_call(move |store| store.update_task(&row)).await?;
        if let Some(slot) = self
            .state
            .write()
            .await
            .tasks
            .iter_mut()
            .find(|t| t.identity.local() == task.identity.local())
        {
            *slot = task.clone();
        }
        Ok(())
    }

    async fn set_working_flag(&self, id: &LocalId, done: bool) {
        if let Some(task) = self
            .state
            .write()
            .await
            .tasks
            .iter_mut()
            .find(|t| t.identity.local() == id)
        {
            task.is_complete = done;
        }
    }
}
