//! SQLite local cache for tasksync.
//!
//! The cache mirrors the tenant's remote collections and holds records
//! created while offline until they are pushed.
//!
//! # Architecture
//!
//! - Every row belongs to one tenant, and a [`LocalStore`] handle only
//!   sees its own tenant's rows
//! - `Tasks` and `Tags` rows carry the local key, the nullable remote key,
//!   and a dirty flag for offline edits of already-synced rows
//! - `TasksTag` links are stored in remote-id space
//! - `PendingDeletes` remembers remote documents deleted while offline
//! - A connection is opened per operation and dropped when it returns

mod error;
mod schema;
mod store;

pub use error::{StorageError, StorageResult};
pub use schema::initialize_schema;
pub use store::{LocalStore, MirrorStats, StoreCounts};
