//! Rollback detection over deployment history.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::environment::Environment;
use crate::model::DeploymentHistoryEntry;
use crate::version::compare_versions;

/// Flag entries that deploy a lower version than the one tracked before them.
///
/// Scans in the order given; callers pass chronologically ascending history.
/// Tracking is per (project, environment). Entries without a version are
/// never flagged and interrupt the chain for their key: the next versioned
/// entry is not compared and simply becomes the tracked version.
pub fn detect_rollbacks(history: &mut [DeploymentHistoryEntry]) {
    let mut tracked: HashMap<(u64, Environment), String> = HashMap::new();

    for entry in history.iter_mut() {
        let key = (entry.project_id, entry.deployment.environment);
        let Some(version) = entry.deployment.version.clone() else {
            tracked.remove(&key);
            continue;
        };

        if let Some(previous) = tracked.get(&key) {
            if compare_versions(&version, previous) == Ordering::Less {
                tracing::debug!(
                    project_id = entry.project_id,
                    environment = %entry.deployment.environment,
                    from = %previous,
                    to = %version,
                    "Rollback detected"
                );
                entry.is_rollback = true;
                entry.rolled_back_from = Some(previous.clone());
            }
        }

        tracked.insert(key, version);
    }
}
