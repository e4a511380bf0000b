//! Per-tenant operation locks.

use std::collections::HashMap;
use std::sync::Arc;
use tasksync_types::TenantId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per tenant.
///
/// Engines for the same tenant must share a registry (clone it); each
/// top-level operation holds the tenant's lock while it runs, so load and
/// push cycles for one tenant never interleave.
#[derive(Clone, Default)]
pub struct TenantLocks {
    inner: Arc<Mutex<HashMap<TenantId, Arc<Mutex<()>>>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the tenant's lock.
    pub async fn acquire(&self, tenant: &TenantId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(tenant.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of tenants seen so far.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
