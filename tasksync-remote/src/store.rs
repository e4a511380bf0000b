//! The remote store contract.

use crate::error::RemoteResult;
use async_trait::async_trait;
use tasksync_types::{CollectionPath, FieldMap, FieldValue, RemoteDocument, RemoteId};

/// Authoritative per-tenant document store.
///
/// Every call is scoped by a [`CollectionPath`], which carries the tenant.
/// Implementations must be safe to share across tasks.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All documents in a collection.
    async fn list(&self, path: &CollectionPath) -> RemoteResult<Vec<RemoteDocument>>;

    /// One document, or `None` if it does not exist.
    async fn get(&self, path: &CollectionPath, id: &RemoteId)
    -> RemoteResult<Option<RemoteDocument>>;

    /// Creates a document and returns its server-assigned id.
    async fn add(&self, path: &CollectionPath, fields: &FieldMap) -> RemoteResult<RemoteId>;

    /// Field-level merge: writes exactly the supplied fields, leaves the
    /// others alone, and creates the document if it is missing. Writing the
    /// same fields twice has no further effect.
    async fn set_merge(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        fields: &FieldMap,
    ) -> RemoteResult<()>;

    /// Updates one field of an existing document. Fails with
    /// [`RemoteError::NotFound`](crate::RemoteError::NotFound) if the
    /// document no longer exists.
    async fn update_field(
        &self,
        path: &CollectionPath,
        id: &RemoteId,
        field: &str,
        value: FieldValue,
    ) -> RemoteResult<()>;

    /// Deletes a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &CollectionPath, id: &RemoteId) -> RemoteResult<()>;
}
