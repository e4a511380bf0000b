//! Offline-first sync engine for tasksync.
//!
//! Keeps a tenant's tasks and tags consistent between the authoritative
//! remote document store and the on-device SQLite cache:
//! - Load pulls and mirrors remote data, or reads the cache when offline
//! - Push reconciles records created or edited offline, adding each pending
//!   record at most once
//! - Mutations write remote first when online and the cache only when offline
//! - Load and push cycles for one tenant are serialized by [`TenantLocks`]
//!
//! Collaborators (session, stores, probe, locks) are injected through
//! [`SyncEngine::new`]; nothing is held in process-wide state.

mod config;
mod connectivity;
mod engine;
mod error;
mod locks;
mod notice;
mod session;

pub use config::EngineConfig;
pub use connectivity::Connectivity;
pub use engine::{LoadOutcome, LoadSource, PushFailure, PushReport, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use locks::TenantLocks;
pub use notice::{Notice, RecordKind};
pub use session::{Session, SessionFile};

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG`, defaulting
/// to `info`. Calling it again is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
