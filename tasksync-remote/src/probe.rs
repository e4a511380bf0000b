//! Connectivity probes.

use crate::config::RemoteConfig;
use crate::error::RemoteResult;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

/// Decides whether the remote store is worth trying.
///
/// Never fails: any problem reaching the endpoint reads as offline.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Reachability check against a known HTTP endpoint. Any HTTP response,
/// whatever its status, means online.
pub struct HttpProbe {
    client: Client,
    url: String,
}

impl HttpProbe {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.probe_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            url: config.probe_url.clone(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), url = %self.url, "probe reached endpoint");
                true
            }
            Err(e) => {
                debug!(error = %e, url = %self.url, "probe failed, treating as offline");
                false
            }
        }
    }
}

/// Probe with a settable answer, for forced offline mode and tests.
#[derive(Debug)]
pub struct ManualProbe {
    online: AtomicBool,
}

impl ManualProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for ManualProbe {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivityProbe for ManualProbe {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
