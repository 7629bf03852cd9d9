//! GitLab REST v4 implementation of [`ProjectHost`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    HostError, HostResult, Job, JobScope, MergeRequestRef, Note, ProjectHost, RepositoryFile,
};

/// Longest error body kept in [`HostError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Page size for note and pipeline-job listings.
const LIST_PAGE_SIZE: u32 = 100;

/// Upper bound on pages walked by a single listing.
const MAX_LIST_PAGES: u32 = 50;

/// Authenticated GitLab API client.
///
/// Timeouts are enforced by the underlying `reqwest::Client`; nothing here
/// retries.
pub struct GitLabClient {
    base: Url,
    token: String,
    client: reqwest::Client,
}

impl GitLabClient {
    /// Create a client for a GitLab instance, e.g. `https://gitlab.example.com`.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> HostResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| HostError::Config(format!("invalid GitLab URL '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(HostError::Config(format!(
                "GitLab URL '{base_url}' cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HostError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base,
            token: token.into(),
            client,
        })
    }

    /// Build `<base>/api/v4/<segments...>`, percent-encoding each segment.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v4"]).extend(segments);
        }
        url
    }

    /// Issue a GET. `Ok(None)` on 404, error on any other non-2xx.
    async fn send(&self, url: Url, query: &[(&str, String)]) -> HostResult<Option<reqwest::Response>> {
        debug!(%url, "GitLab request");

        let response = self
            .client
            .get(url.clone())
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| HostError::Request {
                url: url.to_string(),
                message: e.to_string(),
                timeout: e.is_timeout(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(HostError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(Some(response))
    }

    async fn get_optional_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> HostResult<Option<T>> {
        let Some(response) = self.send(url.clone(), query).await? else {
            return Ok(None);
        };
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| HostError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    /// GET a mandatory resource; a 404 is an error here.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> HostResult<T> {
        self.get_optional_json(url.clone(), query)
            .await?
            .ok_or_else(|| HostError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
                body: String::new(),
            })
    }

    /// GET every page of a listing. Stops at the first short page.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> HostResult<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=MAX_LIST_PAGES {
            let mut paged: Vec<(&str, String)> = query.to_vec();
            paged.push(("per_page", LIST_PAGE_SIZE.to_string()));
            paged.push(("page", page.to_string()));

            let batch: Vec<T> = self.get_json(url.clone(), &paged).await?;
            let short = batch.len() < LIST_PAGE_SIZE as usize;
            items.extend(batch);
            if short {
                return Ok(items);
            }
        }
        warn!(%url, pages = MAX_LIST_PAGES, "Listing truncated at page limit");
        Ok(items)
    }
}

#[async_trait]
impl ProjectHost for GitLabClient {
    async fn list_recent_jobs(
        &self,
        project_id: u64,
        scopes: &[JobScope],
        page_size: u32,
    ) -> HostResult<Vec<Job>> {
        let project = project_id.to_string();
        let url = self.api_url(&["projects", project.as_str(), "jobs"]);
        let mut query: Vec<(&str, String)> = scopes
            .iter()
            .map(|s| ("scope[]", s.as_str().to_string()))
            .collect();
        query.push(("per_page", page_size.to_string()));
        self.get_json(url, &query).await
    }

    async fn fetch_job_artifact_json(
        &self,
        project_id: u64,
        job_id: u64,
        path: &str,
    ) -> HostResult<Option<serde_json::Value>> {
        let project = project_id.to_string();
        let job = job_id.to_string();
        let mut segments = vec!["projects", project.as_str(), "jobs", job.as_str(), "artifacts"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let url = self.api_url(&segments);

        let Some(response) = self.send(url.clone(), &[]).await? else {
            return Ok(None);
        };
        let bytes = response.bytes().await.map_err(|e| HostError::Request {
            url: url.to_string(),
            message: e.to_string(),
            timeout: e.is_timeout(),
        })?;

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(%url, error = %e, "Artifact is not valid JSON");
                Ok(None)
            }
        }
    }

    async fn fetch_repository_file(
        &self,
        project_id: u64,
        path: &str,
        git_ref: &str,
    ) -> HostResult<Option<RepositoryFile>> {
        let project = project_id.to_string();
        let url = self.api_url(&["projects", project.as_str(), "repository", "files", path, "raw"]);

        let Some(response) = self.send(url.clone(), &[("ref", git_ref.to_string())]).await? else {
            return Ok(None);
        };
        let content = response.text().await.map_err(|e| HostError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(RepositoryFile { content }))
    }

    async fn fetch_merge_request_notes(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> HostResult<Vec<Note>> {
        let project = project_id.to_string();
        let iid = mr_iid.to_string();
        let url = self.api_url(&["projects", project.as_str(), "merge_requests", iid.as_str(), "notes"]);
        self.get_all_pages(url, &[("sort", "desc".to_string())])
            .await
    }

    async fn find_merged_merge_request_by_branch(
        &self,
        project_id: u64,
        branch: &str,
    ) -> HostResult<Option<MergeRequestRef>> {
        let project = project_id.to_string();
        let url = self.api_url(&["projects", project.as_str(), "merge_requests"]);
        let query = [
            ("state", "merged".to_string()),
            ("source_branch", branch.to_string()),
            ("per_page", "1".to_string()),
        ];
        let found: Vec<MergeRequestRef> = self.get_json(url, &query).await?;
        Ok(found.into_iter().next())
    }

    async fn list_pipeline_jobs(&self, project_id: u64, pipeline_id: u64) -> HostResult<Vec<Job>> {
        let project = project_id.to_string();
        let pipeline = pipeline_id.to_string();
        let url = self.api_url(&["projects", project.as_str(), "pipelines", pipeline.as_str(), "jobs"]);
        self.get_all_pages(url, &[]).await
    }
}
