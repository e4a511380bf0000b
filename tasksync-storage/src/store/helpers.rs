//! Row conversion helpers shared by the store modules.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use std::collections::{BTreeSet, HashMap};
use tasksync_types::{Identity, LocalId, RemoteId, Tag, Task};

pub(crate) const TASK_COLUMNS: &str =
    "Id, Title, Description, IsDone, CreatedAt, RemoteId, Dirty";
pub(crate) const TAG_COLUMNS: &str = "Id, Name, RemoteId, Dirty";

/// Rows needing a push: no remote key (NULL or the empty-string sentinel),
/// or edited while offline.
pub(crate) const NEEDS_PUSH: &str = "(RemoteId IS NULL OR TRIM(RemoteId) = '' OR Dirty = 1)";

/// Rows that mirror the remote store and carry no unpushed edits.
pub(crate) const MIRRORED: &str = "(RemoteId IS NOT NULL AND TRIM(RemoteId) <> '' AND Dirty = 0)";

/// Raw `Tasks` row before timestamp parsing and link lookup.
pub(crate) struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_done: bool,
    pub created_at: String,
    pub remote_id: Option<String>,
    pub dirty: bool,
}

pub(crate) fn read_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        is_done: row.get(3)?,
        created_at: row.get(4)?,
        remote_id: row.get(5)?,
        dirty: row.get(6)?,
    })
}

impl TaskRow {
    pub(crate) fn into_task(
        self,
        links: &HashMap<String, BTreeSet<RemoteId>>,
    ) -> StorageResult<Task> {
        let identity = Identity::restore(
            LocalId::new(self.id),
            RemoteId::non_empty(self.remote_id),
            self.dirty,
        );
        let tag_ids = identity
            .remote()
            .and_then(|r| links.get(r.as_str()))
            .cloned()
            .unwrap_or_default();
        Ok(Task {
            created_at: parse_timestamp(&self.created_at)?,
            identity,
            title: self.title,
            description: self.description.unwrap_or_default(),
            is_complete: self.is_done,
            tag_ids,
        })
    }
}

pub(crate) fn read_tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let remote: Option<String> = row.get(2)?;
    let dirty: bool = row.get(3)?;
    Ok(Tag {
        identity: Identity::restore(LocalId::new(id), RemoteId::non_empty(remote), dirty),
        name,
    })
}

/// Loads every link of `tenant`, grouped by task remote key.
pub(crate) fn load_links(
    conn: &Connection,
    tenant: &str,
) -> StorageResult<HashMap<String, BTreeSet<RemoteId>>> {
    let mut stmt = conn.prepare("SELECT TaskId, TagId FROM TasksTag WHERE Tenant = ?")?;
    let rows = stmt.query_map([tenant], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut grouped: HashMap<String, BTreeSet<RemoteId>> = HashMap::new();
    for row in rows {
        let (task, tag) = row?;
        grouped.entry(task).or_default().insert(RemoteId::new(tag));
    }
    Ok(grouped)
}

/// Inserts a full task row. Links for its tags are written alongside.
pub(crate) fn insert_task(conn: &Connection, tenant: &str, task: &Task) -> StorageResult<()> {
    conn.execute(
        &format!("INSERT INTO Tasks (Tenant, {TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
        params![
            tenant,
            task.identity.local().as_str(),
            task.title,
            task.description,
            task.is_complete,
            format_timestamp(&task.created_at),
            task.identity.remote().map(RemoteId::as_str),
            task.identity.state() == tasksync_types::SyncState::Modified,
        ],
    )?;
    if let Some(remote) = task.identity.remote() {
        let synced = !task.identity.needs_push();
        for tag in &task.tag_ids {
            conn.execute(
                "INSERT OR IGNORE INTO TasksTag (Tenant, TaskId, TagId, Synced) VALUES (?, ?, ?, ?)",
                params![tenant, remote.as_str(), tag.as_str(), synced],
            )?;
        }
    }
    Ok(())
}

pub(crate) fn insert_tag(conn: &Connection, tenant: &str, tag: &Tag) -> StorageResult<()> {
    conn.execute(
        &format!("INSERT INTO Tags (Tenant, {TAG_COLUMNS}) VALUES (?, ?, ?, ?, ?)"),
        params![
            tenant,
            tag.identity.local().as_str(),
            tag.name,
            tag.identity.remote().map(RemoteId::as_str),
            tag.identity.state() == tasksync_types::SyncState::Modified,
        ],
    )?;
    Ok(())
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses a stored timestamp. Rows written by older clients carry a
/// `Timestamp: ` prefix in front of the RFC 3339 value.
pub(crate) fn parse_timestamp(raw: &str) -> StorageResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    let value = trimmed
        .strip_prefix("Timestamp:")
        .map(str::trim)
        .unwrap_or(trimmed);
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::CorruptRow(format!("bad CreatedAt {raw:?}: {e}")))
}
