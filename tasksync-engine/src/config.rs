//! Engine configuration.

use crate::error::SyncResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tasksync_remote::RemoteConfig;

/// Configuration for the sync engine and the stores it drives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite cache file. Shared by every tenant signed in on the device;
    /// rows are keyed by tenant.
    pub database_path: PathBuf,

    /// Where the signed-in user id is persisted between runs.
    pub session_path: PathBuf,

    /// Deadline for a single remote call, in milliseconds. Applied on top
    /// of the transport timeout so a call cannot hang when connectivity
    /// drops mid-request.
    pub remote_deadline_ms: u64,

    /// Buffer size of the notice channel.
    pub notice_capacity: usize,

    pub remote: RemoteConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("TaskBase.db"),
            session_path: PathBuf::from("auth.json"),
            remote_deadline_ms: 10_000,
            notice_capacity: 64,
            remote: RemoteConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn remote_deadline(&self) -> Duration {
        Duration::from_millis(self.remote_deadline_ms)
    }
}
