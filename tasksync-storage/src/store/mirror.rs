//! Mirror replace: swap the cached copy of remote data for a fresh pull.

use super::LocalStore;
use super::helpers::{MIRRORED, NEEDS_PUSH, insert_tag, insert_task};
use crate::error::StorageResult;
use rusqlite::{Transaction, params};
use std::collections::HashSet;
use tasksync_types::{Collection, Tag, Task};
use tracing::info;

/// What a mirror replace did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MirrorStats {
    pub tasks_written: usize,
    pub tags_written: usize,
    /// Rows with unpushed work that were left untouched.
    pub tasks_kept: usize,
    pub tags_kept: usize,
    /// Pulled documents skipped because a delete for them is still queued.
    pub skipped_deleted: usize,
}

impl LocalStore {
    /// Replaces this tenant's mirrored rows with `tasks` and `tags`, in one
    /// transaction. Rows of other tenants are never touched.
    ///
    /// Only rows that carry a remote key and no unpushed edits are removed.
    /// Pending rows (no remote key) and rows edited offline survive, and a
    /// pulled document never overwrites an offline edit of the same record.
    /// Documents with a queued delete are not re-inserted.
    pub fn replace_mirror(&self, tasks: &[Task], tags: &[Tag]) -> StorageResult<MirrorStats> {
        let tenant = self.tenant_key();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut stats = MirrorStats::default();

        let tombstones = queued_deletes(&tx, tenant)?;

        // Tasks
        let kept_tasks = kept_remote_ids(&tx, "Tasks", tenant)?;
        stats.tasks_kept = count(
            &tx,
            &format!("SELECT COUNT(*) FROM Tasks WHERE Tenant = ?1 AND {NEEDS_PUSH}"),
            tenant,
        )?;
        tx.execute(
            &format!("DELETE FROM Tasks WHERE Tenant = ?1 AND {MIRRORED}"),
            [tenant],
        )?;
        tx.execute(
            "DELETE FROM TasksTag WHERE Tenant = ?1 AND Synced = 1 AND TaskId NOT IN \
             (SELECT RemoteId FROM Tasks WHERE Tenant = ?1 AND RemoteId IS NOT NULL)",
            [tenant],
        )?;
        for task in tasks {
            let Some(remote) = task.remote_id() else {
                continue;
            };
            if tombstones.contains(&(Collection::Tasks, remote.to_string())) {
                stats.skipped_deleted += 1;
                continue;
            }
            if kept_tasks.contains(remote.as_str()) {
                continue;
            }
            insert_task(&tx, tenant, task)?;
            stats.tasks_written += 1;
        }
        tx.execute(
            "DELETE FROM TasksTag WHERE Tenant = ?1 AND TaskId NOT IN \
             (SELECT RemoteId FROM Tasks \
              WHERE Tenant = ?1 AND RemoteId IS NOT NULL AND TRIM(RemoteId) <> '')",
            [tenant],
        )?;

        // Tags
        let kept_tags = kept_remote_ids(&tx, "Tags", tenant)?;
        stats.tags_kept = count(
            &tx,
            &format!("SELECT COUNT(*) FROM Tags WHERE Tenant = ?1 AND {NEEDS_PUSH}"),
            tenant,
        )?;
        tx.execute(
            &format!("DELETE FROM Tags WHERE Tenant = ?1 AND {MIRRORED}"),
            [tenant],
        )?;
        for tag in tags {
            let Some(remote) = tag.remote_id() else {
                continue;
            };
            if tombstones.contains(&(Collection::Tags, remote.to_string())) {
                stats.skipped_deleted += 1;
                continue;
            }
            if kept_tags.contains(remote.as_str()) {
                continue;
            }
            insert_tag(&tx, tenant, tag)?;
            stats.tags_written += 1;
        }

        tx.commit()?;

        info!(
            tenant,
            tasks_written = stats.tasks_written,
            tags_written = stats.tags_written,
            tasks_kept = stats.tasks_kept,
            tags_kept = stats.tags_kept,
            skipped_deleted = stats.skipped_deleted,
            "replaced local mirror"
        );
        Ok(stats)
    }
}

fn queued_deletes(
    tx: &Transaction<'_>,
    tenant: &str,
) -> StorageResult<HashSet<(Collection, String)>> {
    let mut stmt =
        tx.prepare("SELECT Collection, DocumentId FROM PendingDeletes WHERE Tenant = ?")?;
    let rows = stmt
        .query_map([tenant], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .filter_map(|(c, id)| Collection::from_name(&c).map(|c| (c, id)))
        .collect())
}

/// Remote keys of rows edited offline; their pulled versions are ignored.
fn kept_remote_ids(
    tx: &Transaction<'_>,
    table: &str,
    tenant: &str,
) -> StorageResult<HashSet<String>> {
    let mut stmt = tx.prepare(&format!(
        "SELECT RemoteId FROM {table} WHERE Tenant = ? AND Dirty = 1 AND RemoteId IS NOT NULL"
    ))?;
    let ids = stmt
        .query_map(params![tenant], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(ids)
}

fn count(tx: &Transaction<'_>, sql: &str, tenant: &str) -> StorageResult<usize> {
    let n: i64 = tx.query_row(sql, [tenant], |row| row.get(0))?;
    Ok(n as usize)
}
