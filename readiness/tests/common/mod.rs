//! Shared in-memory host for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use release_readiness::host::{
    HostError, HostResult, Job, JobPipeline, JobScope, JobStatus, MergeRequestRef, Note,
    NoteAuthor, ProjectHost, RepositoryFile,
};

/// Mock host that serves canned data and records every call.
#[derive(Default)]
pub struct MockHost {
    jobs: HashMap<u64, Vec<Job>>,
    failing_job_lists: HashSet<u64>,
    artifacts: HashMap<(u64, u64), serde_json::Value>,
    failing_artifacts: HashSet<(u64, u64)>,
    files: HashMap<(u64, String), String>,
    merge_requests: HashMap<(u64, String), MergeRequestRef>,
    notes: HashMap<(u64, u64), Vec<Note>>,
    pipeline_jobs: HashMap<(u64, u64), Vec<Job>>,
    failing_pipelines: HashSet<(u64, u64)>,
    calls: Mutex<Vec<String>>,
}

fn server_error(what: &str) -> HostError {
    HostError::Status {
        url: format!("https://gitlab.test/{what}"),
        status: 500,
        body: "boom".to_string(),
    }
}

/// Route library logs through the test harness; set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl MockHost {
    pub fn new() -> Self {
        init_tracing();
        Self::default()
    }

    pub fn with_jobs(mut self, project_id: u64, jobs: Vec<Job>) -> Self {
        self.jobs.insert(project_id, jobs);
        self
    }

    pub fn with_failing_job_list(mut self, project_id: u64) -> Self {
        self.failing_job_lists.insert(project_id);
        self
    }

    pub fn with_artifact(mut self, project_id: u64, job_id: u64, value: serde_json::Value) -> Self {
        self.artifacts.insert((project_id, job_id), value);
        self
    }

    pub fn with_failing_artifact(mut self, project_id: u64, job_id: u64) -> Self {
        self.failing_artifacts.insert((project_id, job_id));
        self
    }

    pub fn with_file(mut self, project_id: u64, path: &str, content: &str) -> Self {
        self.files
            .insert((project_id, path.to_string()), content.to_string());
        self
    }

    pub fn with_merge_request(mut self, project_id: u64, branch: &str, mr: MergeRequestRef) -> Self {
        self.merge_requests.insert((project_id, branch.to_string()), mr);
        self
    }

    pub fn with_notes(mut self, project_id: u64, mr_iid: u64, notes: Vec<Note>) -> Self {
        self.notes.insert((project_id, mr_iid), notes);
        self
    }

    pub fn with_pipeline_jobs(mut self, project_id: u64, pipeline_id: u64, jobs: Vec<Job>) -> Self {
        self.pipeline_jobs.insert((project_id, pipeline_id), jobs);
        self
    }

    pub fn with_failing_pipeline(mut self, project_id: u64, pipeline_id: u64) -> Self {
        self.failing_pipelines.insert((project_id, pipeline_id));
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl ProjectHost for MockHost {
    async fn list_recent_jobs(
        &self,
        project_id: u64,
        scopes: &[JobScope],
        _page_size: u32,
    ) -> HostResult<Vec<Job>> {
        self.record(format!("jobs:{project_id}"));
        assert_eq!(scopes, &[JobScope::Success, JobScope::Failed]);
        if self.failing_job_lists.contains(&project_id) {
            return Err(server_error("jobs"));
        }
        Ok(self.jobs.get(&project_id).cloned().unwrap_or_default())
    }

    async fn fetch_job_artifact_json(
        &self,
        project_id: u64,
        job_id: u64,
        _path: &str,
    ) -> HostResult<Option<serde_json::Value>> {
        self.record(format!("artifact:{project_id}:{job_id}"));
        if self.failing_artifacts.contains(&(project_id, job_id)) {
            return Err(server_error("artifact"));
        }
        Ok(self.artifacts.get(&(project_id, job_id)).cloned())
    }

    async fn fetch_repository_file(
        &self,
        project_id: u64,
        path: &str,
        _git_ref: &str,
    ) -> HostResult<Option<RepositoryFile>> {
        self.record(format!("file:{project_id}:{path}"));
        Ok(self
            .files
            .get(&(project_id, path.to_string()))
            .map(|content| RepositoryFile {
                content: content.clone(),
            }))
    }

    async fn fetch_merge_request_notes(&self, project_id: u64, mr_iid: u64) -> HostResult<Vec<Note>> {
        self.record(format!("notes:{project_id}:{mr_iid}"));
        Ok(self
            .notes
            .get(&(project_id, mr_iid))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_merged_merge_request_by_branch(
        &self,
        project_id: u64,
        branch: &str,
    ) -> HostResult<Option<MergeRequestRef>> {
        self.record(format!("mr:{project_id}:{branch}"));
        Ok(self
            .merge_requests
            .get(&(project_id, branch.to_string()))
            .cloned())
    }

    async fn list_pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> HostResult<Vec<Job>> {
        self.record(format!("pipeline:{project_id}:{pipeline_id}"));
        if self.failing_pipelines.contains(&(project_id, pipeline_id)) {
            return Err(server_error("pipeline"));
        }
        Ok(self
            .pipeline_jobs
            .get(&(project_id, pipeline_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// A finished job `hours_ago` before now.
pub fn job(
    id: u64,
    name: &str,
    pipeline_id: u64,
    pipeline_iid: u64,
    git_ref: &str,
    hours_ago: i64,
) -> Job {
    let finished = Utc::now() - Duration::hours(hours_ago);
    Job {
        id,
        name: name.to_string(),
        stage: "deploy".to_string(),
        status: JobStatus::Success,
        created_at: finished - Duration::minutes(5),
        finished_at: Some(finished),
        web_url: format!("https://gitlab.test/jobs/{id}"),
        pipeline: JobPipeline {
            id: pipeline_id,
            iid: Some(pipeline_iid),
            git_ref: git_ref.to_string(),
            web_url: format!("https://gitlab.test/pipelines/{pipeline_id}"),
        },
    }
}

/// A job in a pipeline's post-deploy stage.
pub fn stage_job(id: u64, stage: &str, status: JobStatus) -> Job {
    let mut j = job(id, &format!("smoke-{id}"), 1, 1, "main", 1);
    j.stage = stage.to_string();
    j.status = status;
    j
}

pub fn merge_request(iid: u64) -> MergeRequestRef {
    MergeRequestRef {
        iid,
        web_url: format!("https://gitlab.test/merge_requests/{iid}"),
        title: format!("Release {iid}"),
    }
}

pub fn note(id: u64, author: &str, body: &str, at: DateTime<Utc>) -> Note {
    Note {
        id,
        body: body.to_string(),
        author: NoteAuthor {
            username: author.to_string(),
        },
        created_at: at,
        system: false,
    }
}
