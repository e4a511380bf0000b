//! Local cache schema.
//!
//! Every table carries the owning tenant, and every key includes it, so
//! several signed-in users can share one cache file without seeing each
//! other's rows.

use crate::error::StorageResult;
use rusqlite::Connection;

/// Creates the cache tables if they do not exist.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Tasks (
            Tenant TEXT NOT NULL,
            Id TEXT NOT NULL,
            Title TEXT NOT NULL,
            Description TEXT,
            IsDone INTEGER NOT NULL DEFAULT 0,
            CreatedAt TEXT NOT NULL,
            RemoteId TEXT,
            Dirty INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (Tenant, Id)
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_remote ON Tasks(Tenant, RemoteId);

        CREATE TABLE IF NOT EXISTS Tags (
            Tenant TEXT NOT NULL,
            Id TEXT NOT NULL,
            Name TEXT NOT NULL,
            RemoteId TEXT,
            Dirty INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (Tenant, Id)
        );
        CREATE INDEX IF NOT EXISTS idx_tags_remote ON Tags(Tenant, RemoteId);

        CREATE TABLE IF NOT EXISTS TasksTag (
            Tenant TEXT NOT NULL,
            TaskId TEXT NOT NULL,
            TagId TEXT NOT NULL,
            Synced INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (Tenant, TaskId, TagId)
        );

        CREATE TABLE IF NOT EXISTS PendingDeletes (
            Tenant TEXT NOT NULL,
            Collection TEXT NOT NULL,
            DocumentId TEXT NOT NULL,
            PRIMARY KEY (Tenant, Collection, DocumentId)
        );
        "#,
    )?;
    Ok(())
}
