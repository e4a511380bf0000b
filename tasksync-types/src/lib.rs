//! Core types for tasksync.
//!
//! Every record that lives in both stores carries an [`Identity`]: a local
//! key that always exists and a remote key that is assigned exactly once,
//! when the record is first accepted by the remote store. The identity's
//! [`SyncState`] is derived from it and only changes through the transition
//! methods on [`Identity`].
//!
//! Remote documents are modelled as [`FieldMap`]s of typed [`FieldValue`]s;
//! the translation between documents and records lives in [`translate`].

mod document;
mod error;
mod identity;
mod model;
mod tenant;
pub mod translate;

pub use document::{ArrayValue, FieldMap, FieldValue, MapValue, NullValue, RemoteDocument};
pub use error::{TypesError, TypesResult};
pub use identity::{Identity, LocalId, RemoteId, SyncState};
pub use model::{Tag, Task, TaskTagLink};
pub use tenant::{Collection, CollectionPath, TenantId};
