//! Remote store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the Firestore client and the HTTP connectivity probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// REST endpoint root, without the `/v1` suffix.
    pub base_url: String,

    pub project_id: String,

    pub database_id: String,

    /// Per-request transport timeout in seconds.
    pub request_timeout_secs: u64,

    /// Documents requested per list page.
    pub page_size: u32,

    /// Endpoint the HTTP probe checks for reachability.
    pub probe_url: String,

    /// Probe timeout in milliseconds. Kept short: the probe runs at the
    /// entry of every engine operation.
    pub probe_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://firestore.googleapis.com".to_string(),
            project_id: String::new(),
            database_id: "(default)".to_string(),
            request_timeout_secs: 30,
            page_size: 300,
            probe_url: "http://www.google.com".to_string(),
            probe_timeout_ms: 3_000,
        }
    }
}

impl RemoteConfig {
    /// `{base}/v1/projects/{project}/databases/{database}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database_id
        )
    }
}
