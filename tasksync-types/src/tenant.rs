//! Tenant identity and the per-tenant collection hierarchy.

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user that scopes every store operation.
///
/// The id becomes one segment of `users/{uid}/...`, so it may not contain
/// `/` or be `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> TypesResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypesError::EmptyTenant);
        }
        if id.contains('/') || id == "." || id == ".." {
            return Err(TypesError::InvalidTenant(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = TypesError;

    fn try_from(id: String) -> TypesResult<Self> {
        Self::new(id)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collection under `users/{uid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    Tasks,
    Tags,
    TaskTags,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Self::Tasks => "Tasks",
            Self::Tags => "Tags",
            Self::TaskTags => "TasksTag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Tasks" => Some(Self::Tasks),
            "Tags" => Some(Self::Tags),
            "TasksTag" => Some(Self::TaskTags),
            _ => None,
        }
    }
}

/// Fully-qualified collection path for one tenant, e.g. `users/u1/Tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    tenant: TenantId,
    collection: Collection,
}

impl CollectionPath {
    pub fn new(tenant: &TenantId, collection: Collection) -> Self {
        Self {
            tenant: tenant.clone(),
            collection,
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}", self.tenant, self.collection.name())
    }
}
