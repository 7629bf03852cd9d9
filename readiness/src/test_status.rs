//! Post-deploy test stage outcome.

use crate::host::{HostResult, Job, JobStatus, ProjectHost};
use crate::model::PostDeployTestStatus;

/// Stage names recognised as post-deploy, compared case-insensitively.
const POST_DEPLOY_STAGES: [&str; 2] = ["post-deploy", "post_deploy"];

fn is_post_deploy_stage(stage: &str) -> bool {
    POST_DEPLOY_STAGES
        .iter()
        .any(|name| stage.eq_ignore_ascii_case(name))
}

/// Summarise the post-deploy jobs of a pipeline.
///
/// Any failed job fails the stage. Jobs still running, skipped or canceled
/// neither pass nor fail it, so `passed` means "no failure among completed
/// jobs". The first completed job supplies the link fields.
pub fn summarize_post_deploy(jobs: &[Job]) -> PostDeployTestStatus {
    let post_deploy: Vec<&Job> = jobs
        .iter()
        .filter(|job| is_post_deploy_stage(&job.stage))
        .collect();

    if post_deploy.is_empty() {
        return PostDeployTestStatus::absent();
    }

    let any_failed = post_deploy
        .iter()
        .any(|job| job.status == JobStatus::Failed);
    let all_completed_succeeded = post_deploy
        .iter()
        .filter(|job| job.status.is_terminal_outcome())
        .all(|job| job.status == JobStatus::Success);
    let representative = post_deploy
        .iter()
        .find(|job| job.status.is_terminal_outcome());

    PostDeployTestStatus {
        exists: true,
        passed: Some(!any_failed && all_completed_succeeded),
        job_id: representative.map(|job| job.id),
        job_url: representative.map(|job| job.web_url.clone()),
        job_name: representative.map(|job| job.name.clone()),
    }
}

/// Fetch a pipeline's jobs and summarise its post-deploy stage.
pub async fn get_post_deploy_test_status(
    host: &dyn ProjectHost,
    project_id: u64,
    pipeline_id: u64,
) -> HostResult<PostDeployTestStatus> {
    let jobs = host.list_pipeline_jobs(project_id, pipeline_id).await?;
    let status = summarize_post_deploy(&jobs);
    tracing::debug!(
        project_id,
        pipeline_id,
        exists = status.exists,
        passed = ?status.passed,
        "Post-deploy test status"
    );
    Ok(status)
}
