//! Dashboard configuration: GitLab connection, project list and core tunables.
//!
//! Loaded from a TOML file, then overridden by `GITLAB_URL` / `GITLAB_TOKEN`
//! and the `READINESS_*` variables understood by [`ReadinessSettings`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use release_readiness::{GitLabClient, ProjectRef, ReadinessService, ReadinessSettings};
use serde::Deserialize;
use tracing::debug;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "readiness.toml";

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// GitLab base URL, e.g. `https://gitlab.example.com`.
    #[serde(default)]
    pub gitlab_url: Option<String>,
    /// Personal or project access token. Prefer `GITLAB_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub projects: Vec<ProjectRef>,
    #[serde(default)]
    pub settings: ReadinessSettings,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gitlab_url: None,
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
            projects: Vec::new(),
            settings: ReadinessSettings::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        let config: DashboardConfig = toml::from_str(&content)
            .context(format!("Failed to parse dashboard config {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration the way the binary does.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// read if present and defaults are used otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(&fallback)?
                } else {
                    debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Self::default()
                }
            }
        };

        Ok(config.with_overrides(
            std::env::var("GITLAB_URL").ok(),
            std::env::var("GITLAB_TOKEN").ok(),
        ))
    }

    /// Replace connection details with non-empty overrides and apply
    /// `READINESS_*` settings overrides.
    pub fn with_overrides(mut self, gitlab_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = gitlab_url.filter(|u| !u.trim().is_empty()) {
            self.gitlab_url = Some(url);
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self.settings = self.settings.with_env_overrides();
        self
    }

    /// Projects to report on. A `filter` naming an unconfigured project id
    /// is still honoured, labelled by its id.
    pub fn select_projects(&self, filter: Option<u64>) -> Result<Vec<ProjectRef>> {
        match filter {
            Some(id) => Ok(vec![self
                .projects
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .unwrap_or_else(|| ProjectRef {
                    id,
                    name: id.to_string(),
                })]),
            None if self.projects.is_empty() => {
                bail!("No projects configured; add [[projects]] to the config or pass --project")
            }
            None => Ok(self.projects.clone()),
        }
    }

    /// Build a readiness service backed by the configured GitLab instance.
    pub fn build_service(&self) -> Result<ReadinessService> {
        self.settings
            .validate()
            .context("Invalid [settings] in dashboard config")?;
        let url = self
            .gitlab_url
            .as_deref()
            .context("GitLab URL missing; set gitlab_url or GITLAB_URL")?;
        let token = self
            .token
            .as_deref()
            .context("GitLab token missing; set token or GITLAB_TOKEN")?;

        let client = GitLabClient::new(
            url,
            token,
            Duration::from_secs(self.request_timeout_secs),
        )
        .context("Failed to create GitLab client")?;

        Ok(ReadinessService::new(
            Arc::new(client),
            self.settings.clone(),
        ))
    }
}
