//! Plain-text and JSON rendering of readiness results.

use anyhow::{Context, Result};
use release_readiness::host::JobStatus;
use release_readiness::{
    environment_statuses, DeploymentHistoryEntry, Environment, PostDeployTestStatus,
    ProjectDeployments, ProjectReadinessOutcome, ProjectRef, Signoff,
};
use serde::Serialize;

/// Pretty-printed JSON for `--json` output.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialise report")
}

fn job_status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Success => "success",
        JobStatus::Failed => "failed",
        JobStatus::Canceled => "canceled",
        JobStatus::Running => "running",
        _ => "other",
    }
}

fn signoff_label(signoff: Option<&Signoff>) -> String {
    match signoff {
        Some(s) if s.is_valid => format!("{} by {}", s.version, s.authorized_by),
        Some(s) => format!("unauthorised ({})", s.author),
        None => "-".to_string(),
    }
}

fn tests_label(status: &PostDeployTestStatus) -> &'static str {
    match (status.exists, status.passed) {
        (false, _) => "none",
        (true, Some(true)) => "passed",
        (true, Some(false)) => "failed",
        (true, None) => "unknown",
    }
}

/// Latest deployment per environment for one project.
pub fn format_deployments(project: &ProjectRef, result: &ProjectDeployments) -> String {
    let mut lines = vec![format!("== {} ({}) ==", project.name, project.id)];

    if let Some(error) = &result.error {
        lines.push(format!("  error: {error}"));
        return lines.join("\n");
    }

    for env in Environment::ALL {
        match result.deployments.get(&env) {
            Some(d) => lines.push(format!(
                "  {:<5} {:<12} {:<8} {}  {}{}",
                env.as_str(),
                d.version.as_deref().unwrap_or("-"),
                job_status_label(d.status),
                d.timestamp.format("%Y-%m-%d %H:%M"),
                d.pipeline_ref,
                d.ticket_key
                    .as_deref()
                    .map(|k| format!(" [{k}]"))
                    .unwrap_or_default(),
            )),
            None => lines.push(format!("  {:<5} -", env.as_str())),
        }
    }

    lines.join("\n")
}

/// Readiness matrix for each project, one line per environment.
pub fn format_readiness(outcomes: &[ProjectReadinessOutcome]) -> String {
    let mut lines = Vec::new();

    for outcome in outcomes {
        lines.push(format!("== {} ({}) ==", outcome.project.name, outcome.project.id));

        if let Some(error) = &outcome.error {
            let hint = if outcome.retryable { " (retryable)" } else { "" };
            lines.push(format!("  error: {error}{hint}"));
            lines.push(String::new());
            continue;
        }

        let statuses = environment_statuses(&outcome.records);
        for (env, status) in &statuses {
            match outcome.records.iter().find(|r| r.environment == *env) {
                Some(record) => lines.push(format!(
                    "  {:<5} {:<12} {:<15} sign-off: {}  tests: {}",
                    env.as_str(),
                    record.version.as_deref().unwrap_or("-"),
                    status.as_str(),
                    signoff_label(record.signoff.as_ref()),
                    tests_label(&record.test_status),
                )),
                None => lines.push(format!("  {:<5} {:<12} {}", env.as_str(), "-", status.as_str())),
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Chronological deployment history, optionally only rollbacks.
pub fn format_history(entries: &[DeploymentHistoryEntry], rollbacks_only: bool) -> String {
    let lines: Vec<String> = entries
        .iter()
        .filter(|e| !rollbacks_only || e.is_rollback)
        .map(|e| {
            let rollback = match (&e.rolled_back_from, e.is_rollback) {
                (Some(from), true) => format!("  ROLLBACK from {from}"),
                _ => String::new(),
            };
            format!(
                "{}  {:<20} {:<5} {:<12} {}{}",
                e.deployment.timestamp.format("%Y-%m-%d %H:%M"),
                e.project_name,
                e.deployment.environment.as_str(),
                e.deployment.version.as_deref().unwrap_or("-"),
                job_status_label(e.deployment.status),
                rollback,
            )
        })
        .collect();

    if lines.is_empty() {
        return "No deployments found.".to_string();
    }
    lines.join("\n")
}
