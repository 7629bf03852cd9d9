//! Project-hosting API boundary.
//!
//! [`ProjectHost`] is the only seam through which the readiness core talks to
//! the outside world. [`GitLabClient`] implements it over the GitLab REST v4
//! API; tests provide in-memory implementations.
//!
//! "Not found" is modelled as `Ok(None)` and never as an error, so callers
//! have to decide what an absent artifact, file or merge request means.

pub mod gitlab;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use gitlab::GitLabClient;

/// Result type alias for host calls
pub type HostResult<T> = Result<T, HostError>;

/// Transport-level failures talking to the hosting API.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("request to {url} failed: {message}")]
    Request {
        url: String,
        message: String,
        timeout: bool,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl HostError {
    /// Network failures, rate limits and server errors may succeed later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::Config(_) => false,
        }
    }
}

/// CI job status as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
    #[serde(other)]
    Other,
}

impl JobStatus {
    /// Finished with a definite pass/fail outcome.
    pub fn is_terminal_outcome(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// Status filter accepted by [`ProjectHost::list_recent_jobs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobScope {
    Success,
    Failed,
}

impl JobScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Pipeline summary embedded in a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPipeline {
    pub id: u64,
    #[serde(default)]
    pub iid: Option<u64>,
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    #[serde(default)]
    pub web_url: String,
}

/// A CI job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub stage: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_url: String,
    pub pipeline: JobPipeline,
}

impl Job {
    /// Finish time, or creation time for jobs that never finished.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.finished_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAuthor {
    pub username: String,
}

/// A merge request comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: NoteAuthor,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub system: bool,
}

/// Minimal merge request handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequestRef {
    pub iid: u64,
    #[serde(alias = "web_url")]
    pub web_url: String,
    pub title: String,
}

/// Raw repository file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub content: String,
}

/// The operations the readiness core needs from a project-hosting API.
#[async_trait]
pub trait ProjectHost: Send + Sync {
    /// Recent jobs in the given statuses, newest first.
    async fn list_recent_jobs(
        &self,
        project_id: u64,
        scopes: &[JobScope],
        page_size: u32,
    ) -> HostResult<Vec<Job>>;

    /// A JSON artifact of a job; `None` when absent or not valid JSON.
    async fn fetch_job_artifact_json(
        &self,
        project_id: u64,
        job_id: u64,
        path: &str,
    ) -> HostResult<Option<serde_json::Value>>;

    /// A repository file at `git_ref`; `None` when absent.
    async fn fetch_repository_file(
        &self,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> HostResult<Option<RepositoryFile>>;

    /// All comments on a merge request, including system notes.
    async fn fetch_merge_request_notes(&self, project_id: u64, mr_iid: u64)
        -> HostResult<Vec<Note>>;

    /// The merged merge request whose source branch is `branch`, if any.
    async fn find_merged_merge_request_by_branch(
        &self,
        project_id: u64,
        branch: &str,
    ) -> HostResult<Option<MergeRequestRef>>;

    /// Every job of one pipeline.
    async fn list_pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> HostResult<Vec<Job>>;
}
