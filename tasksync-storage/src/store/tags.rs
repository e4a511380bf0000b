//! Tag CRUD.

use super::LocalStore;
use super::helpers::{NEEDS_PUSH, TAG_COLUMNS, insert_tag, read_tag_row};
use crate::error::{StorageError, StorageResult};
use rusqlite::{OptionalExtension, params};
use tasksync_types::{LocalId, RemoteId, SyncState, Tag};

impl LocalStore {
    pub fn get_tags(&self) -> StorageResult<Vec<Tag>> {
        self.query_tags(&format!(
            "SELECT {TAG_COLUMNS} FROM Tags WHERE Tenant = ? ORDER BY Name, Id"
        ))
    }

    /// Tags created or renamed while offline.
    pub fn get_pending_sync_tags(&self) -> StorageResult<Vec<Tag>> {
        self.query_tags(&format!(
            "SELECT {TAG_COLUMNS} FROM Tags WHERE Tenant = ? AND {NEEDS_PUSH} ORDER BY Name, Id"
        ))
    }

    pub fn get_tag(&self, id: &LocalId) -> StorageResult<Option<Tag>> {
        let conn = self.connect()?;
        Ok(conn
            .query_row(
                &format!("SELECT {TAG_COLUMNS} FROM Tags WHERE Tenant = ? AND Id = ?"),
                params![self.tenant_key(), id.as_str()],
                read_tag_row,
            )
            .optional()?)
    }

    pub fn add_tag(&self, tag: &Tag) -> StorageResult<()> {
        let conn = self.connect()?;
        insert_tag(&conn, self.tenant_key(), tag)
    }

    pub fn update_tag(&self, tag: &Tag) -> StorageResult<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE Tags SET Name = ?, RemoteId = ?, Dirty = ? WHERE Tenant = ? AND Id = ?",
            params![
                tag.name,
                tag.identity.remote().map(RemoteId::as_str),
                tag.identity.state() == SyncState::Modified,
                self.tenant_key(),
                tag.identity.local().as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(format!("tag {}", tag.identity.local())));
        }
        Ok(())
    }

    /// Removes every tag and every link of this tenant, since links cannot
    /// outlive their tag.
    pub fn delete_all_tags(&self) -> StorageResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM TasksTag WHERE Tenant = ?", [self.tenant_key()])?;
        tx.execute("DELETE FROM Tags WHERE Tenant = ?", [self.tenant_key()])?;
        tx.commit()?;
        Ok(())
    }

    fn query_tags(&self, sql: &str) -> StorageResult<Vec<Tag>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let tags = stmt
            .query_map([self.tenant_key()], read_tag_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }
}
