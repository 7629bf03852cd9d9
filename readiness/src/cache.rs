//! Lookup caches that survive across readiness requests.
//!
//! Two maps only: ownership-by-project and merged-MR-by-(project, branch).
//! Entries are never evicted individually and never overwritten; the first
//! stored value wins. [`ReadinessCache::clear`] empties both.
//!
//! Concurrent requests may both miss and both fetch; the second store is a
//! no-op, so the worst case is one redundant fetch.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::host::MergeRequestRef;

type BranchKey = (u64, String);

#[derive(Debug, Default)]
pub struct ReadinessCache {
    owners: RwLock<HashMap<u64, Vec<String>>>,
    merge_requests: RwLock<HashMap<BranchKey, Option<MergeRequestRef>>>,
}

impl ReadinessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached ownership list for a project.
    pub async fn owners(&self, project_id: u64) -> Option<Vec<String>> {
        self.owners.read().await.get(&project_id).cloned()
    }

    pub async fn store_owners(&self, project_id: u64, owners: Vec<String>) {
        self.owners
            .write()
            .await
            .entry(project_id)
            .or_insert(owners);
    }

    /// Cached lookup result. The outer `None` is a miss; `Some(None)` records
    /// that no merged merge request exists for the branch.
    pub async fn merge_request(
        &self,
        project_id: u64,
        branch: &str,
    ) -> Option<Option<MergeRequestRef>> {
        self.merge_requests
            .read()
            .await
            .get(&(project_id, branch.to_string()))
            .cloned()
    }

    pub async fn store_merge_request(
        &self,
        project_id: u64,
        branch: &str,
        merge_request: Option<MergeRequestRef>,
    ) {
        self.merge_requests
            .write()
            .await
            .entry((project_id, branch.to_string()))
            .or_insert(merge_request);
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.owners.write().await.clear();
        self.merge_requests.write().await.clear();
        tracing::info!("Readiness caches cleared");
    }

    /// Number of cached (ownership, merge request) entries.
    pub async fn entry_counts(&self) -> (usize, usize) {
        (
            self.owners.read().await.len(),
            self.merge_requests.read().await.len(),
        )
    }
}
