//! Release Readiness Library
//!
//! Answers "is this version ready to promote?" for a project, version and
//! environment by reconciling three independently sourced signals:
//!
//! - the latest **deployment** per environment (CI deploy jobs)
//! - a human **sign-off** comment on the merged merge request
//! - the **post-deploy test** stage of the deploying pipeline
//!
//! It also rebuilds recent deployment history and flags rollbacks.
//!
//! # Components
//!
//! - [`grammar`]: job-name classifier, ticket extractor, sign-off parser,
//!   ownership file parser (pure functions)
//! - [`ownership`]: ownership file lookup, cached per project
//! - [`deployments`]: latest-per-environment aggregator and history builder
//! - [`test_status`]: post-deploy stage resolver
//! - [`status`]: readiness decision table
//! - [`signoff`]: merged-MR lookup and sign-off selection
//! - [`rollback`]: rollback detection over ordered history
//! - [`service`]: [`ReadinessService`], the per-project orchestrator
//! - [`host`]: the [`ProjectHost`] boundary and its GitLab implementation
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use release_readiness::{GitLabClient, ReadinessService, ReadinessSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitLabClient::new("https://gitlab.example.com", "token", Duration::from_secs(30))?;
//! let service = ReadinessService::new(Arc::new(client), ReadinessSettings::from_env());
//! for record in service.project_readiness(42, "payments-api", None).await? {
//!     println!("{} {:?} {}", record.environment, record.version, record.status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod deployments;
pub mod environment;
pub mod error;
pub mod grammar;
pub mod host;
pub mod model;
pub mod ownership;
pub mod rollback;
pub mod service;
pub mod settings;
pub mod signoff;
pub mod status;
pub mod test_status;
pub mod version;

pub use cache::ReadinessCache;
pub use environment::Environment;
pub use error::{ReadinessError, ReadinessResult};
pub use grammar::{extract_jira_key, parse_codeowners, parse_deploy_job_name, parse_signoff_comment};
pub use host::{GitLabClient, HostError, HostResult, ProjectHost};
pub use model::{
    Deployment, DeploymentHistoryEntry, PostDeployTestStatus, ProjectDeployments, ProjectRef,
    Signoff, VersionReadiness,
};
pub use rollback::detect_rollbacks;
pub use service::{ProjectReadinessOutcome, ReadinessService};
pub use settings::ReadinessSettings;
pub use status::{calculate_readiness_status, environment_statuses, ReadinessStatus};
