//! Task/tag links and queued remote deletes.

use super::LocalStore;
use crate::error::StorageResult;
use rusqlite::params;
use tasksync_types::{Collection, RemoteId, TaskTagLink};

impl LocalStore {
    /// Records a task/tag link. Returns false if the pair was already linked.
    pub fn assign_tag(&self, link: &TaskTagLink) -> StorageResult<bool> {
        let conn = self.connect()?;
        let inserted = conn.execute(
            "INSERT INTO TasksTag (Tenant, TaskId, TagId, Synced) VALUES (?, ?, ?, ?) \
             ON CONFLICT DO NOTHING",
            params![
                self.tenant_key(),
                link.task_id.as_str(),
                link.tag_id.as_str(),
                link.synced
            ],
        )?;
        Ok(inserted > 0)
    }

    pub fn get_task_tags(&self, task_id: &RemoteId) -> StorageResult<Vec<TaskTagLink>> {
        self.query_links(
            "SELECT TaskId, TagId, Synced FROM TasksTag \
             WHERE Tenant = ?1 AND TaskId = ?2 ORDER BY TagId",
            Some(task_id.as_str()),
        )
    }

    /// Links whose remote document has not been written yet.
    pub fn get_unsynced_links(&self) -> StorageResult<Vec<TaskTagLink>> {
        self.query_links(
            "SELECT TaskId, TagId, Synced FROM TasksTag \
             WHERE Tenant = ?1 AND Synced = 0 ORDER BY TaskId, TagId",
            None,
        )
    }

    pub fn mark_link_synced(&self, link: &TaskTagLink) -> StorageResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE TasksTag SET Synced = 1 WHERE Tenant = ? AND TaskId = ? AND TagId = ?",
            params![self.tenant_key(), link.task_id.as_str(), link.tag_id.as_str()],
        )?;
        Ok(())
    }

    /// Remembers a remote document to delete on the next push.
    pub fn queue_remote_delete(&self, collection: Collection, id: &RemoteId) -> StorageResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR IGNORE INTO PendingDeletes (Tenant, Collection, DocumentId) VALUES (?, ?, ?)",
            params![self.tenant_key(), collection.name(), id.as_str()],
        )?;
        Ok(())
    }

    /// Queued remote deletes. Rows naming an unknown collection are skipped.
    pub fn pending_remote_deletes(&self) -> StorageResult<Vec<(Collection, RemoteId)>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT Collection, DocumentId FROM PendingDeletes WHERE Tenant = ? \
             ORDER BY Collection, DocumentId",
        )?;
        let rows = stmt
            .query_map([self.tenant_key()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows
            .into_iter()
            .filter_map(|(collection, id)| {
                Collection::from_name(&collection).map(|c| (c, RemoteId::new(id)))
            })
            .collect())
    }

    pub fn clear_remote_delete(&self, collection: Collection, id: &RemoteId) -> StorageResult<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM PendingDeletes WHERE Tenant = ? AND Collection = ? AND DocumentId = ?",
            params![self.tenant_key(), collection.name(), id.as_str()],
        )?;
        Ok(())
    }

    fn query_links(&self, sql: &str, task_id: Option<&str>) -> StorageResult<Vec<TaskTagLink>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<TaskTagLink> {
            Ok(TaskTagLink {
                task_id: RemoteId::new(row.get::<_, String>(0)?),
                tag_id: RemoteId::new(row.get::<_, String>(1)?),
                synced: row.get(2)?,
            })
        };
        let links = match task_id {
            Some(id) => stmt
                .query_map(params![self.tenant_key(), id], map)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map(params![self.tenant_key()], map)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(links)
    }
}
