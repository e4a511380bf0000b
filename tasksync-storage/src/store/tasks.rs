//! Task CRUD.

use super::LocalStore;
use super::helpers::{NEEDS_PUSH, TASK_COLUMNS, insert_task, load_links, read_task_row};
use crate::error::{StorageError, StorageResult};
use rusqlite::{OptionalExtension, params};
use tasksync_types::{Collection, LocalId, RemoteId, SyncState, Task};
use tracing::debug;

impl LocalStore {
    /// All cached tasks, oldest first.
    pub fn get_tasks(&self) -> StorageResult<Vec<Task>> {
        self.query_tasks(&format!(
            "SELECT {TASK_COLUMNS} FROM Tasks WHERE Tenant = ? ORDER BY CreatedAt, Id"
        ))
    }

    /// Tasks that still need a push: never added remotely, or edited offline.
    pub fn get_pending_sync_tasks(&self) -> StorageResult<Vec<Task>> {
        self.query_tasks(&format!(
            "SELECT {TASK_COLUMNS} FROM Tasks WHERE Tenant = ? AND {NEEDS_PUSH} ORDER BY CreatedAt, Id"
        ))
    }

    pub fn get_task(&self, id: &LocalId) -> StorageResult<Option<Task>> {
        self.find_task("Id", id.as_str())
    }

    pub fn find_task_by_remote(&self, remote: &RemoteId) -> StorageResult<Option<Task>> {
        self.find_task("RemoteId", remote.as_str())
    }

    pub fn add_task(&self, task: &Task) -> StorageResult<()> {
        let conn = self.connect()?;
        insert_task(&conn, self.tenant_key(), task)?;
        debug!(task_id = %task.identity.local(), pending = task.is_pending(), "cached task");
        Ok(())
    }

    /// Updates a task row in place, keyed by its local id. Writes the remote
    /// key and dirty flag from the task's identity. `CreatedAt` is never
    /// rewritten; tag membership is maintained through [`LocalStore::assign_tag`].
    pub fn update_task(&self, task: &Task) -> StorageResult<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE Tasks SET Title = ?, Description = ?, IsDone = ?, RemoteId = ?, Dirty = ? \
             WHERE Tenant = ? AND Id = ?",
            params![
                task.title,
                task.description,
                task.is_complete,
                task.identity.remote().map(RemoteId::as_str),
                task.identity.state() == SyncState::Modified,
                self.tenant_key(),
                task.identity.local().as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!(
                "task {}",
                task.identity.local()
            )));
        }
        Ok(())
    }

    /// Deletes a task and every link that references it by local or remote key.
    /// Returns false if no such task existed.
    pub fn delete_task(&self, id: &LocalId) -> StorageResult<bool> {
        self.delete_task_inner(id, false)
    }

    /// Deletes a task while offline. If the task was known to the remote
    /// store, its document and link documents are queued for deletion on the
    /// next push.
    pub fn delete_task_deferred(&self, id: &LocalId) -> StorageResult<bool> {
        self.delete_task_inner(id, true)
    }

    fn delete_task_inner(&self, id: &LocalId, queue_remote: bool) -> StorageResult<bool> {
        let tenant = self.tenant_key();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let remote: Option<Option<String>> = tx
            .query_row(
                "SELECT RemoteId FROM Tasks WHERE Tenant = ? AND Id = ?",
                params![tenant, id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(remote) = remote else {
            return Ok(false);
        };
        let remote = RemoteId::non_empty(remote);

        if queue_remote {
            if let Some(remote) = &remote {
                let link_docs: Vec<String> = {
                    let mut stmt = tx.prepare(
                        "SELECT TaskId || '_' || TagId FROM TasksTag \
                         WHERE Tenant = ? AND TaskId = ? AND Synced = 1",
                    )?;
                    let rows = stmt.query_map(params![tenant, remote.as_str()], |row| row.get(0))?;
                    rows.collect::<Result<_, _>>()?
                };
                for doc in &link_docs {
                    tx.execute(
                        "INSERT OR IGNORE INTO PendingDeletes (Tenant, Collection, DocumentId) \
                         VALUES (?, ?, ?)",
                        params![tenant, Collection::TaskTags.name(), doc],
                    )?;
                }
                tx.execute(
                    "INSERT OR IGNORE INTO PendingDeletes (Tenant, Collection, DocumentId) \
                     VALUES (?, ?, ?)",
                    params![tenant, Collection::Tasks.name(), remote.as_str()],
                )?;
            }
        }

        let links = tx.execute(
            "DELETE FROM TasksTag WHERE Tenant = ? AND (TaskId = ? OR TaskId = ?)",
            params![
                tenant,
                id.as_str(),
                remote.as_ref().map(RemoteId::as_str).unwrap_or(id.as_str())
            ],
        )?;
        tx.execute(
            "DELETE FROM Tasks WHERE Tenant = ? AND Id = ?",
            params![tenant, id.as_str()],
        )?;
        tx.commit()?;

        debug!(task_id = %id, links_removed = links, queued = queue_remote, "deleted cached task");
        Ok(true)
    }

    /// Removes every task and every link of this tenant.
    pub fn delete_all_tasks(&self) -> StorageResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM TasksTag WHERE Tenant = ?", [self.tenant_key()])?;
        tx.execute("DELETE FROM Tasks WHERE Tenant = ?", [self.tenant_key()])?;
        tx.commit()?;
        Ok(())
    }

    fn find_task(&self, column: &str, key: &str) -> StorageResult<Option<Task>> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM Tasks WHERE Tenant = ? AND {column} = ?"),
                params![self.tenant_key(), key],
                read_task_row,
            )
            .optional()?;
        match row {
            Some(row) => Ok(Some(row.into_task(&load_links(&conn, self.tenant_key())?)?)),
            None => Ok(None),
        }
    }

    /// Runs a task query whose only parameter is the tenant.
    fn query_tasks(&self, sql: &str) -> StorageResult<Vec<Task>> {
        let conn = self.connect()?;
        let rows = {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([self.tenant_key()], read_task_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let links = load_links(&conn, self.tenant_key())?;
        rows.into_iter().map(|row| row.into_task(&links)).collect()
    }
}
