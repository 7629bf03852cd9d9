//! Records produced by the readiness core.
//!
//! Everything here is derived per request and never persisted. Field names
//! serialise in camelCase for the presentation layer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::host::{JobStatus, MergeRequestRef};
use crate::status::ReadinessStatus;

/// A project to report on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: u64,
    pub name: String,
}

/// The latest deploy job for one project and environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub job_id: u64,
    pub job_name: String,
    pub environment: Environment,
    /// Artifact version, else `#<pipeline iid>`, else `None`.
    pub version: Option<String>,
    pub status: JobStatus,
    pub timestamp: DateTime<Utc>,
    pub pipeline_id: u64,
    pub pipeline_iid: Option<u64>,
    pub pipeline_ref: String,
    pub job_url: String,
    pub pipeline_url: String,
    pub ticket_key: Option<String>,
}

/// Latest deployment per environment, plus the failure that emptied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDeployments {
    pub deployments: BTreeMap<Environment, Deployment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One deploy job in a project's recent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentHistoryEntry {
    pub project_id: u64,
    pub project_name: String,
    #[serde(flatten)]
    pub deployment: Deployment,
    /// Set only by [`crate::rollback::detect_rollbacks`].
    #[serde(default)]
    pub is_rollback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled_back_from: Option<String>,
}

/// A sign-off comment resolved against the ownership file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signoff {
    pub version: String,
    pub environment: Environment,
    pub author: String,
    /// The authorising username, empty when the author is not an owner.
    pub authorized_by: String,
    pub timestamp: DateTime<Utc>,
    pub note_id: u64,
    pub mr_iid: u64,
    pub is_valid: bool,
}

/// Outcome of the post-deploy stage of a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeployTestStatus {
    pub exists: bool,
    pub passed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
}

impl PostDeployTestStatus {
    /// No post-deploy stage in the pipeline.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn has_failed(&self) -> bool {
        self.exists && self.passed == Some(false)
    }
}

/// The readiness verdict for one project and environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionReadiness {
    pub project_id: u64,
    pub project_name: String,
    pub version: Option<String>,
    pub environment: Environment,
    pub deployment: Option<Deployment>,
    pub signoff: Option<Signoff>,
    pub test_status: PostDeployTestStatus,
    pub status: ReadinessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mr: Option<MergeRequestRef>,
}
