//! Tunables for the readiness core.

use serde::{Deserialize, Serialize};

use crate::error::{ReadinessError, ReadinessResult};

/// Largest `per_page` GitLab accepts.
const MAX_PAGE_SIZE: u32 = 100;

/// Longest history window accepted, in days.
const MAX_HISTORY_DAYS: i64 = 3650;

/// Settings shared by the aggregator, history builder and ownership resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSettings {
    /// Number of recent jobs fetched per project.
    pub job_page_size: u32,
    /// Job artifact carrying `{"version": "..."}`.
    pub version_artifact_path: String,
    /// Ownership file locations, tried in order.
    pub codeowners_paths: Vec<String>,
    /// Ref the ownership file is read from.
    pub default_ref: String,
    /// History entries older than this are dropped.
    pub history_retention_days: i64,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            job_page_size: 100,
            version_artifact_path: "version.json".to_string(),
            codeowners_paths: vec![
                "CODEOWNERS".to_string(),
                ".gitlab/CODEOWNERS".to_string(),
                "docs/CODEOWNERS".to_string(),
            ],
            default_ref: "HEAD".to_string(),
            history_retention_days: 30,
        }
    }
}

impl ReadinessSettings {
    /// Defaults overridden by `READINESS_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `READINESS_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(size) = std::env::var("READINESS_JOB_PAGE_SIZE") {
            if let Ok(n) = size.parse() {
                self.job_page_size = n;
            }
        }
        if let Ok(path) = std::env::var("READINESS_VERSION_ARTIFACT") {
            self.version_artifact_path = path;
        }
        if let Ok(paths) = std::env::var("READINESS_CODEOWNERS_PATHS") {
            let parsed: Vec<String> = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if !parsed.is_empty() {
                self.codeowners_paths = parsed;
            }
        }
        if let Ok(git_ref) = std::env::var("READINESS_DEFAULT_REF") {
            self.default_ref = git_ref;
        }
        if let Ok(days) = std::env::var("READINESS_HISTORY_DAYS") {
            if let Ok(n) = days.parse() {
                self.history_retention_days = n;
            }
        }
        self
    }

    /// Reject settings the host API or the history window cannot honour.
    pub fn validate(&self) -> ReadinessResult<()> {
        if self.job_page_size == 0 || self.job_page_size > MAX_PAGE_SIZE {
            return Err(ReadinessError::config(format!(
                "job_page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.job_page_size
            )));
        }
        if !(1..=MAX_HISTORY_DAYS).contains(&self.history_retention_days) {
            return Err(ReadinessError::config(format!(
                "history_retention_days must be between 1 and {MAX_HISTORY_DAYS}, got {}",
                self.history_retention_days
            )));
        }
        if self.codeowners_paths.is_empty() {
            return Err(ReadinessError::config("codeowners_paths must not be empty"));
        }
        if self.version_artifact_path.trim().is_empty() {
            return Err(ReadinessError::config("version_artifact_path must not be empty"));
        }
        Ok(())
    }
}
