//! Readiness decision table.
//!
//! Combines the three signals in strict priority order:
//!
//! ```text
//! 1. no deployment                         → not-deployed
//! 2. post-deploy tests exist and failed    → tests-failed   (outranks sign-off)
//! 3. no sign-off, or sign-off not valid    → pending-signoff
//! 4. otherwise                             → ready
//! ```
//!
//! The table is total and stateless; every call stands alone.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::model::{Deployment, PostDeployTestStatus, Signoff, VersionReadiness};

/// Readiness verdict for one version in one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessStatus {
    NotDeployed,
    TestsFailed,
    PendingSignoff,
    Ready,
}

impl ReadinessStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotDeployed => "not-deployed",
            Self::TestsFailed => "tests-failed",
            Self::PendingSignoff => "pending-signoff",
            Self::Ready => "ready",
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluate the decision table.
pub fn calculate_readiness_status(
    deployment: Option<&Deployment>,
    signoff: Option<&Signoff>,
    test_status: &PostDeployTestStatus,
) -> ReadinessStatus {
    if deployment.is_none() {
        return ReadinessStatus::NotDeployed;
    }
    if test_status.has_failed() {
        return ReadinessStatus::TestsFailed;
    }
    match signoff {
        Some(s) if s.is_valid => ReadinessStatus::Ready,
        _ => ReadinessStatus::PendingSignoff,
    }
}

/// Status for every environment, `not-deployed` where no record exists.
pub fn environment_statuses(records: &[VersionReadiness]) -> BTreeMap<Environment, ReadinessStatus> {
    let mut statuses: BTreeMap<Environment, ReadinessStatus> = Environment::ALL
        .iter()
        .map(|env| {
            (
                *env,
                calculate_readiness_status(None, None, &PostDeployTestStatus::absent()),
            )
        })
        .collect();

    for record in records {
        statuses.insert(record.environment, record.status);
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::JobStatus;
    use chrono::Utc;

    fn deployment() -> Deployment {
        Deployment {
            job_id: 1,
            job_name: "deploy-uat".into(),
            environment: Environment::Uat,
            version: Some("1.0.0".into()),
            status: JobStatus::Success,
            timestamp: Utc::now(),
            pipeline_id: 10,
            pipeline_iid: Some(3),
            pipeline_ref: "main".into(),
            job_url: String::new(),
            pipeline_url: String::new(),
            ticket_key: None,
        }
    }

    fn signoff(is_valid: bool) -> Signoff {
        Signoff {
            version: "1.0.0".into(),
            environment: Environment::Uat,
            author: "jane".into(),
            authorized_by: if is_valid { "jane".into() } else { String::new() },
            timestamp: Utc::now(),
            note_id: 5,
            mr_iid: 2,
            is_valid,
        }
    }

    fn tests(exists: bool, passed: Option<bool>) -> PostDeployTestStatus {
        PostDeployTestStatus {
            exists,
            passed,
            ..Default::default()
        }
    }

    #[test]
    fn test_not_deployed_dominates() {
        for status in [tests(true, Some(false)), tests(true, Some(true)), tests(false, None)] {
            let valid = signoff(true);
            assert_eq!(
                calculate_readiness_status(None, Some(&valid), &status),
                ReadinessStatus::NotDeployed
            );
            assert_eq!(
                calculate_readiness_status(None, None, &status),
                ReadinessStatus::NotDeployed
            );
        }
    }

    #[test]
    fn test_failed_tests_outrank_valid_signoff() {
        let d = deployment();
        let s = signoff(true);
        assert_eq!(
            calculate_readiness_status(Some(&d), Some(&s), &tests(true, Some(false))),
            ReadinessStatus::TestsFailed
        );
    }

    #[test]
    fn test_pending_signoff_cases() {
        let d = deployment();
        assert_eq!(
            calculate_readiness_status(Some(&d), None, &tests(false, None)),
            ReadinessStatus::PendingSignoff
        );
        let invalid = signoff(false);
        assert_eq!(
            calculate_readiness_status(Some(&d), Some(&invalid), &tests(true, Some(true))),
            ReadinessStatus::PendingSignoff
        );
    }

    #[test]
    fn test_ready() {
        let d = deployment();
        let s = signoff(true);
        assert_eq!(
            calculate_readiness_status(Some(&d), Some(&s), &tests(true, Some(true))),
            ReadinessStatus::Ready
        );
        // No post-deploy stage at all does not block readiness.
        assert_eq!(
            calculate_readiness_status(Some(&d), Some(&s), &tests(false, None)),
            ReadinessStatus::Ready
        );
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ReadinessStatus::PendingSignoff).unwrap(),
            "\"pending-signoff\""
        );
        assert_eq!(ReadinessStatus::TestsFailed.to_string(), "tests-failed");
    }

    #[test]
    fn test_environment_statuses_fill_gaps() {
        let record = VersionReadiness {
            project_id: 1,
            project_name: "api".into(),
            version: Some("1.0.0".into()),
            environment: Environment::Uat,
            deployment: Some(deployment()),
            signoff: None,
            test_status: PostDeployTestStatus::absent(),
            status: ReadinessStatus::PendingSignoff,
            mr: None,
        };
        let statuses = environment_statuses(&[record]);
        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[&Environment::Uat], ReadinessStatus::PendingSignoff);
        assert_eq!(statuses[&Environment::Prod], ReadinessStatus::NotDeployed);
    }
}
