//! Ownership file resolution.
//!
//! The ownership file lists the usernames allowed to sign off. A project
//! without one has an empty owner list, which means anyone may sign off.

use tracing::debug;

use crate::cache::ReadinessCache;
use crate::grammar::parse_codeowners;
use crate::host::{HostResult, ProjectHost};
use crate::settings::ReadinessSettings;

/// Owners of a project, read from the first ownership file found at the
/// default ref. Cached per project until the cache is cleared.
pub async fn get_codeowners(
    host: &dyn ProjectHost,
    cache: &ReadinessCache,
    settings: &ReadinessSettings,
    project_id: u64,
) -> HostResult<Vec<String>> {
    if let Some(owners) = cache.owners(project_id).await {
        return Ok(owners);
    }

    let mut owners = Vec::new();
    for path in &settings.codeowners_paths {
        if let Some(file) = host
            .fetch_repository_file(project_id, path, &settings.default_ref)
            .await?
        {
            owners = parse_codeowners(&file.content);
            debug!(project_id, path = %path, owners = owners.len(), "Ownership file loaded");
            break;
        }
    }

    if owners.is_empty() {
        debug!(project_id, "No owners found; any author may sign off");
    }

    cache.store_owners(project_id, owners.clone()).await;
    Ok(owners)
}

/// The username that authorises `author`, if any.
///
/// An empty owner list authorises everyone. Usernames compare
/// case-insensitively.
pub fn authorize(owners: &[String], author: &str) -> Option<String> {
    if owners.is_empty() {
        return Some(author.to_string());
    }
    owners
        .iter()
        .find(|owner| owner.eq_ignore_ascii_case(author))
        .cloned()
}
