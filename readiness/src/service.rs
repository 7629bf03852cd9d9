//! Readiness orchestration.
//!
//! [`ReadinessService`] owns the host client, the settings and the shared
//! [`ReadinessCache`], and exposes the operations the presentation layer
//! calls. Per project, environments are processed one after another in
//! promotion order so that environments deployed from the same branch reuse
//! the merged-MR lookup. A host failure in any environment aborts the whole
//! project.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::ReadinessCache;
use crate::deployments;
use crate::environment::Environment;
use crate::error::{ReadinessError, ReadinessResult};
use crate::host::ProjectHost;
use crate::model::{
    Deployment, DeploymentHistoryEntry, PostDeployTestStatus, ProjectDeployments, ProjectRef,
    VersionReadiness,
};
use crate::ownership;
use crate::rollback::detect_rollbacks;
use crate::settings::ReadinessSettings;
use crate::signoff;
use crate::status::{calculate_readiness_status, ReadinessStatus};
use crate::test_status;

/// Readiness of one project within a multi-project run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReadinessOutcome {
    pub project: ProjectRef,
    pub records: Vec<VersionReadiness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retryable: bool,
}

pub struct ReadinessService {
    host: Arc<dyn ProjectHost>,
    settings: ReadinessSettings,
    cache: Arc<ReadinessCache>,
}

impl ReadinessService {
    /// Create a service with a fresh cache.
    pub fn new(host: Arc<dyn ProjectHost>, settings: ReadinessSettings) -> Self {
        Self {
            host,
            settings,
            cache: Arc::new(ReadinessCache::new()),
        }
    }

    /// Use an existing cache, e.g. one shared with another service.
    pub fn with_cache(mut self, cache: Arc<ReadinessCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ReadinessCache {
        &self.cache
    }

    pub fn settings(&self) -> &ReadinessSettings {
        &self.settings
    }

    /// Latest deployment per environment; failures come back in `error`.
    pub async fn project_deployments(&self, project_id: u64) -> ProjectDeployments {
        deployments::get_project_deployments(self.host.as_ref(), &self.settings, project_id).await
    }

    /// Recent deploy jobs of one project, newest first, without rollback flags.
    pub async fn project_deployment_history(
        &self,
        project_id: u64,
        project_name: &str,
    ) -> Vec<DeploymentHistoryEntry> {
        deployments::get_project_deployment_history(
            self.host.as_ref(),
            &self.settings,
            project_id,
            project_name,
        )
        .await
    }

    /// Usernames allowed to sign off for a project.
    pub async fn codeowners(&self, project_id: u64) -> ReadinessResult<Vec<String>> {
        ownership::get_codeowners(self.host.as_ref(), &self.cache, &self.settings, project_id)
            .await
            .map_err(|e| ReadinessError::host(project_id, "load ownership file", e))
    }

    /// Post-deploy stage outcome of one pipeline.
    pub async fn post_deploy_test_status(
        &self,
        project_id: u64,
        pipeline_id: u64,
    ) -> ReadinessResult<PostDeployTestStatus> {
        test_status::get_post_deploy_test_status(self.host.as_ref(), project_id, pipeline_id)
            .await
            .map_err(|e| ReadinessError::host(project_id, "list pipeline jobs", e))
    }

    /// One readiness record per deployed environment of a project.
    ///
    /// `deployments_by_env` reuses deployments the caller already holds;
    /// when `None` they are fetched, and a failed job listing is an error
    /// rather than an empty project.
    pub async fn project_readiness(
        &self,
        project_id: u64,
        project_name: &str,
        deployments_by_env: Option<&BTreeMap<Environment, Deployment>>,
    ) -> ReadinessResult<Vec<VersionReadiness>> {
        let fetched;
        let deployments = match deployments_by_env {
            Some(d) => d,
            None => {
                fetched = deployments::load_latest_deployments(
                    self.host.as_ref(),
                    &self.settings,
                    project_id,
                )
                .await
                .map_err(|e| ReadinessError::host(project_id, "list recent jobs", e))?;
                &fetched
            }
        };

        if deployments.is_empty() {
            return Ok(Vec::new());
        }

        let owners = self.codeowners(project_id).await?;
        let mut records = Vec::with_capacity(deployments.len());

        for (environment, deployment) in deployments {
            let record = self
                .environment_readiness(project_id, project_name, *environment, deployment, &owners)
                .await?;
            records.push(record);
        }

        info!(
            project_id,
            project = project_name,
            environments = records.len(),
            ready = records
                .iter()
                .filter(|r| r.status == ReadinessStatus::Ready)
                .count(),
            "Computed project readiness"
        );
        Ok(records)
    }

    async fn environment_readiness(
        &self,
        project_id: u64,
        project_name: &str,
        environment: Environment,
        deployment: &Deployment,
        owners: &[String],
    ) -> ReadinessResult<VersionReadiness> {
        let host = self.host.as_ref();

        let mr = signoff::resolve_merge_request(host, &self.cache, project_id, &deployment.pipeline_ref)
            .await
            .map_err(|e| ReadinessError::host(project_id, "find merged merge request", e))?;

        let signoff = match &mr {
            Some(mr) => signoff::find_signoff(
                host,
                project_id,
                mr,
                owners,
                environment,
                deployment.version.as_deref(),
            )
            .await
            .map_err(|e| ReadinessError::host(project_id, "fetch merge request notes", e))?,
            None => None,
        };

        let test_status = self
            .post_deploy_test_status(project_id, deployment.pipeline_id)
            .await?;

        let status = calculate_readiness_status(Some(deployment), signoff.as_ref(), &test_status);

        Ok(VersionReadiness {
            project_id,
            project_name: project_name.to_string(),
            version: deployment.version.clone(),
            environment,
            deployment: Some(deployment.clone()),
            signoff,
            test_status,
            status,
            mr,
        })
    }

    /// Readiness for many projects. Projects run concurrently and fail
    /// independently of each other.
    pub async fn portfolio_readiness(&self, projects: &[ProjectRef]) -> Vec<ProjectReadinessOutcome> {
        join_all(projects.iter().map(|project| async move {
            match self.project_readiness(project.id, &project.name, None).await {
                Ok(records) => ProjectReadinessOutcome {
                    project: project.clone(),
                    records,
                    error: None,
                    retryable: false,
                },
                Err(e) => {
                    warn!(project_id = project.id, error = %e, "Readiness failed");
                    ProjectReadinessOutcome {
                        project: project.clone(),
                        records: Vec::new(),
                        retryable: e.is_retryable(),
                        error: Some(e.to_string()),
                    }
                }
            }
        }))
        .await
    }

    /// Merged history of many projects, oldest first, with rollbacks flagged.
    pub async fn portfolio_history(&self, projects: &[ProjectRef]) -> Vec<DeploymentHistoryEntry> {
        let per_project = join_all(
            projects
                .iter()
                .map(|project| self.project_deployment_history(project.id, &project.name)),
        )
        .await;

        // Each project's history is newest first; reverse before the stable
        // sort so equal timestamps stay in chronological order.
        let mut history: Vec<DeploymentHistoryEntry> = per_project
            .into_iter()
            .flat_map(|entries| entries.into_iter().rev())
            .collect();
        history.sort_by(|a, b| a.deployment.timestamp.cmp(&b.deployment.timestamp));
        detect_rollbacks(&mut history);
        history
    }

    /// Forget cached ownership lists and merged-MR lookups.
    pub async fn clear_readiness_cache(&self) {
        self.cache.clear().await;
    }
}
