//! Search over the working set.

use super::SyncEngine;
use crate::error::SyncResult;
use tasksync_types::{RemoteId, Task};

impl SyncEngine {
    /// Tasks whose title starts with `query`, ignoring case. No store is
    /// touched, except that a blank query reloads the full set via
    /// [`SyncEngine::load`].
    pub async fn search(&self, query: &str) -> SyncResult<Vec<Task>> {
        if query.trim().is_empty() {
            return Ok(self.load().await?.tasks);
        }
        Ok(self
            .state
            .read()
            .await
            .tasks
            .iter()
            .filter(|task| task.title_starts_with(query))
            .cloned()
            .collect())
    }

    /// Tasks in the working set carrying the given tag.
    pub async fn tasks_with_tag(&self, tag: &RemoteId) -> Vec<Task> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .filter(|task| task.has_tag(tag))
            .cloned()
            .collect()
    }
}
