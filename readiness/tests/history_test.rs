//! Multi-project history merge and rollback flagging.

mod common;

use std::sync::Arc;

use common::{job, MockHost};
use release_readiness::{Environment, ProjectRef, ReadinessService, ReadinessSettings};
use serde_json::json;

fn projects() -> Vec<ProjectRef> {
    vec![
        ProjectRef {
            id: 1,
            name: "payments".into(),
        },
        ProjectRef {
            id: 2,
            name: "ledger".into(),
        },
    ]
}

fn portfolio_host() -> MockHost {
    MockHost::new()
        .with_jobs(
            1,
            vec![
                job(12, "deploy-uat", 120, 6, "main", 1),
                job(11, "deploy-uat", 110, 5, "main", 48),
            ],
        )
        .with_artifact(1, 12, json!({"version": "1.1.0"}))
        .with_artifact(1, 11, json!({"version": "1.2.0"}))
        .with_jobs(
            2,
            vec![
                job(22, "deploy-prod", 220, 9, "main", 10),
                job(21, "deploy-uat", 210, 8, "main", 36),
            ],
        )
        .with_artifact(2, 21, json!({"version": "0.9.0"}))
}

#[tokio::test]
async fn test_portfolio_history_is_oldest_first() {
    let service = ReadinessService::new(Arc::new(portfolio_host()), ReadinessSettings::default());

    let history = service.portfolio_history(&projects()).await;

    let ids: Vec<u64> = history.iter().map(|e| e.deployment.job_id).collect();
    assert_eq!(ids, vec![11, 21, 22, 12]);
    assert!(history
        .windows(2)
        .all(|w| w[0].deployment.timestamp <= w[1].deployment.timestamp));
}

#[tokio::test]
async fn test_rollbacks_flagged_per_project_and_environment() {
    let service = ReadinessService::new(Arc::new(portfolio_host()), ReadinessSettings::default());

    let history = service.portfolio_history(&projects()).await;

    let flagged: Vec<_> = history.iter().filter(|e| e.is_rollback).collect();
    assert_eq!(flagged.len(), 1);
    let rollback = flagged[0];
    assert_eq!(rollback.project_id, 1);
    assert_eq!(rollback.deployment.environment, Environment::Uat);
    assert_eq!(rollback.deployment.version.as_deref(), Some("1.1.0"));
    assert_eq!(rollback.rolled_back_from.as_deref(), Some("1.2.0"));

    // Ledger's lower UAT version sits between payments' deploys but is
    // tracked separately.
    let ledger_uat = history.iter().find(|e| e.deployment.job_id == 21).unwrap();
    assert!(!ledger_uat.is_rollback);
}

#[tokio::test]
async fn test_failing_project_drops_out_of_history() {
    let host = portfolio_host().with_failing_job_list(2);
    let service = ReadinessService::new(Arc::new(host), ReadinessSettings::default());

    let history = service.portfolio_history(&projects()).await;

    assert!(history.iter().all(|e| e.project_id == 1));
    assert_eq!(history.len(), 2);
    assert!(history[1].is_rollback);
}

#[tokio::test]
async fn test_history_entry_serialises_flat() {
    let service = ReadinessService::new(Arc::new(portfolio_host()), ReadinessSettings::default());

    let history = service.portfolio_history(&projects()).await;
    let rollback = history.iter().find(|e| e.is_rollback).unwrap();
    let value = serde_json::to_value(rollback).unwrap();

    assert_eq!(value["projectName"], "payments");
    assert_eq!(value["jobId"], 12);
    assert_eq!(value["environment"], "uat");
    assert_eq!(value["isRollback"], true);
    assert_eq!(value["rolledBackFrom"], "1.2.0");
}
