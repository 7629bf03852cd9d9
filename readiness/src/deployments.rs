//! Deployment aggregation and history.
//!
//! Both views start from the same page of recent finished jobs, which the
//! host returns newest first. The aggregator keeps the first (latest) deploy
//! job per environment; the history builder keeps every deploy job inside
//! the retention window. Neither re-sorts its input.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::environment::Environment;
use crate::grammar::{extract_jira_key, parse_deploy_job_name};
use crate::host::{HostResult, Job, JobScope, ProjectHost};
use crate::model::{Deployment, DeploymentHistoryEntry, ProjectDeployments};
use crate::settings::ReadinessSettings;

/// Job statuses considered by both views.
const FINISHED_SCOPES: [JobScope; 2] = [JobScope::Success, JobScope::Failed];

/// Deploy jobs on the first page of recent finished jobs, in host order.
async fn fetch_deploy_jobs(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
) -> HostResult<Vec<(Environment, Job)>> {
    let jobs = host
        .list_recent_jobs(project_id, &FINISHED_SCOPES, settings.job_page_size)
        .await?;
    let total = jobs.len();

    let deploy_jobs: Vec<(Environment, Job)> = jobs
        .into_iter()
        .filter_map(|job| parse_deploy_job_name(&job.name).map(|env| (env, job)))
        .collect();

    debug!(
        project_id,
        jobs = total,
        deploy_jobs = deploy_jobs.len(),
        "Classified recent jobs"
    );
    Ok(deploy_jobs)
}

/// Display version of a deploy job.
///
/// The version artifact wins when it carries a non-empty `version` string.
/// Otherwise, including when the artifact fetch itself fails, falls back to
/// `#<pipeline iid>`.
pub async fn resolve_version(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
    job: &Job,
) -> Option<String> {
    match host
        .fetch_job_artifact_json(project_id, job.id, &settings.version_artifact_path)
        .await
    {
        Ok(Some(artifact)) => {
            if let Some(version) = artifact
                .get("version")
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|v| !v.is_empty())
            {
                return Some(version.to_string());
            }
            debug!(project_id, job_id = job.id, "Version artifact has no version field");
        }
        Ok(None) => {}
        Err(e) => {
            debug!(project_id, job_id = job.id, error = %e, "Version artifact unavailable");
        }
    }

    job.pipeline.iid.map(|iid| format!("#{iid}"))
}

fn to_deployment(environment: Environment, job: Job, version: Option<String>) -> Deployment {
    let ticket_key = extract_jira_key(&job.pipeline.git_ref);
    let timestamp = job.timestamp();
    Deployment {
        job_id: job.id,
        job_name: job.name,
        environment,
        version,
        status: job.status,
        timestamp,
        pipeline_id: job.pipeline.id,
        pipeline_iid: job.pipeline.iid,
        pipeline_ref: job.pipeline.git_ref,
        job_url: job.web_url,
        pipeline_url: job.pipeline.web_url,
        ticket_key,
    }
}

/// Resolve versions for all jobs concurrently and build deployments.
async fn build_deployments(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
    jobs: Vec<(Environment, Job)>,
) -> Vec<Deployment> {
    let versions = join_all(
        jobs.iter()
            .map(|(_, job)| resolve_version(host, settings, project_id, job)),
    )
    .await;

    jobs.into_iter()
        .zip(versions)
        .map(|((env, job), version)| to_deployment(env, job, version))
        .collect()
}

/// Latest deployment per environment, propagating host failures.
pub async fn load_latest_deployments(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
) -> HostResult<BTreeMap<Environment, Deployment>> {
    let mut latest: BTreeMap<Environment, Job> = BTreeMap::new();
    for (env, job) in fetch_deploy_jobs(host, settings, project_id).await? {
        latest.entry(env).or_insert(job);
    }

    let deployments = build_deployments(host, settings, project_id, latest.into_iter().collect())
        .await
        .into_iter()
        .map(|d| (d.environment, d))
        .collect();
    Ok(deployments)
}

/// Latest deployment per environment.
///
/// Never fails: a host error yields an empty map with the error message.
pub async fn get_project_deployments(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
) -> ProjectDeployments {
    match load_latest_deployments(host, settings, project_id).await {
        Ok(deployments) => {
            info!(
                project_id,
                environments = deployments.len(),
                "Resolved latest deployments"
            );
            ProjectDeployments {
                deployments,
                error: None,
            }
        }
        Err(e) => {
            warn!(project_id, error = %e, "Failed to load deployments");
            ProjectDeployments {
                deployments: BTreeMap::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

/// Every deploy job finished (or created) within the retention window
/// before `now`, newest first. Never fails: a host error yields an empty list.
pub async fn get_project_deployment_history_at(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
    project_name: &str,
    now: DateTime<Utc>,
) -> Vec<DeploymentHistoryEntry> {
    let jobs = match fetch_deploy_jobs(host, settings, project_id).await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!(project_id, error = %e, "Failed to load deployment history");
            return Vec::new();
        }
    };

    // An out-of-range window keeps everything rather than overflowing.
    let cutoff = Duration::try_days(settings.history_retention_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let retained: Vec<(Environment, Job)> = jobs
        .into_iter()
        .filter(|(_, job)| job.timestamp() >= cutoff)
        .collect();

    let entries: Vec<DeploymentHistoryEntry> =
        build_deployments(host, settings, project_id, retained)
            .await
            .into_iter()
            .map(|deployment| DeploymentHistoryEntry {
                project_id,
                project_name: project_name.to_string(),
                deployment,
                is_rollback: false,
                rolled_back_from: None,
            })
            .collect();

    info!(project_id, entries = entries.len(), "Built deployment history");
    entries
}

/// [`get_project_deployment_history_at`] relative to the current time.
pub async fn get_project_deployment_history(
    host: &dyn ProjectHost,
    settings: &ReadinessSettings,
    project_id: u64,
    project_name: &str,
) -> Vec<DeploymentHistoryEntry> {
    get_project_deployment_history_at(host, settings, project_id, project_name, Utc::now()).await
}
