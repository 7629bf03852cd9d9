//! Sign-off lookup: deployment → merged MR → comments → verdict.

use tracing::debug;

use crate::cache::ReadinessCache;
use crate::environment::Environment;
use crate::grammar::parse_signoff_comment;
use crate::host::{HostResult, MergeRequestRef, Note, ProjectHost};
use crate::model::Signoff;
use crate::ownership::authorize;
use crate::version::same_version;

/// The merged merge request whose source branch is `branch`.
///
/// Results, including "none found", are cached per (project, branch) so
/// environments deployed from the same branch share one lookup.
pub async fn resolve_merge_request(
    host: &dyn ProjectHost,
    cache: &ReadinessCache,
    project_id: u64,
    branch: &str,
) -> HostResult<Option<MergeRequestRef>> {
    if let Some(cached) = cache.merge_request(project_id, branch).await {
        return Ok(cached);
    }

    let found = host
        .find_merged_merge_request_by_branch(project_id, branch)
        .await?;
    debug!(
        project_id,
        branch,
        mr_iid = found.as_ref().map(|mr| mr.iid),
        "Merged MR lookup"
    );
    cache
        .store_merge_request(project_id, branch, found.clone())
        .await;
    Ok(found)
}

/// Parse every non-system note into a sign-off, newest first.
pub fn evaluate_notes(notes: &[Note], owners: &[String], mr_iid: u64) -> Vec<Signoff> {
    let mut signoffs: Vec<Signoff> = notes
        .iter()
        .filter(|note| !note.system)
        .filter_map(|note| {
            let claim = parse_signoff_comment(&note.body)?;
            let authorized_by = authorize(owners, &note.author.username);
            Some(Signoff {
                version: claim.version,
                environment: claim.environment,
                author: note.author.username.clone(),
                is_valid: authorized_by.is_some(),
                authorized_by: authorized_by.unwrap_or_default(),
                timestamp: note.created_at,
                note_id: note.id,
                mr_iid,
            })
        })
        .collect();

    signoffs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    signoffs
}

/// Pick the sign-off governing a deployment.
///
/// Preference: a valid sign-off for the exact version, then any valid
/// sign-off for the environment (approval given before a patch bump), then
/// an unauthorised sign-off for the exact version so it can be shown as
/// such. Within each tier the newest comment wins.
pub fn select_signoff(
    signoffs: &[Signoff],
    environment: Environment,
    version: Option<&str>,
) -> Option<Signoff> {
    let for_env: Vec<&Signoff> = signoffs
        .iter()
        .filter(|s| s.environment == environment)
        .collect();
    let exact = |s: &Signoff| version.is_some_and(|v| same_version(&s.version, v));

    for_env
        .iter()
        .copied()
        .find(|s| s.is_valid && exact(*s))
        .or_else(|| for_env.iter().copied().find(|s| s.is_valid))
        .or_else(|| for_env.iter().copied().find(|s| exact(*s)))
        .cloned()
}

/// Fetch the comments of `mr` and resolve the governing sign-off.
pub async fn find_signoff(
    host: &dyn ProjectHost,
    project_id: u64,
    mr: &MergeRequestRef,
    owners: &[String],
    environment: Environment,
    version: Option<&str>,
) -> HostResult<Option<Signoff>> {
    let notes = host.fetch_merge_request_notes(project_id, mr.iid).await?;
    let signoffs = evaluate_notes(&notes, owners, mr.iid);
    let selected = select_signoff(&signoffs, environment, version);

    debug!(
        project_id,
        mr_iid = mr.iid,
        environment = %environment,
        candidates = signoffs.len(),
        found = selected.is_some(),
        "Sign-off resolved"
    );
    Ok(selected)
}
