//! `readiness`: release readiness and deployment history from GitLab.
//!
//! # Usage
//!
//! ```bash
//! # Latest deployment per environment
//! readiness deployments
//!
//! # Readiness matrix for one project, as JSON
//! readiness readiness --project 42 --json
//!
//! # Rollbacks over the last 30 days
//! GITLAB_TOKEN=... readiness --config ./readiness.toml history --rollbacks-only
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use readiness_cli::config::DashboardConfig;
use readiness_cli::report;
use tracing::info;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the dashboard config (defaults to ./readiness.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Latest deployment per environment
    Deployments {
        /// Only this project id
        #[arg(long)]
        project: Option<u64>,
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Readiness status per environment
    Readiness {
        /// Only this project id
        #[arg(long)]
        project: Option<u64>,
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Deployment history with rollbacks flagged
    History {
        /// Only this project id
        #[arg(long)]
        project: Option<u64>,
        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
        /// Only show rollbacks
        #[arg(long, default_value_t = false)]
        rollbacks_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = DashboardConfig::load(args.config.as_deref())?;
    let service = config.build_service()?;

    match args.command {
        Command::Deployments { project, json } => {
            let projects = config.select_projects(project)?;
            info!(projects = projects.len(), "Fetching deployments");

            let mut results = Vec::with_capacity(projects.len());
            for project in &projects {
                results.push((project, service.project_deployments(project.id).await));
            }

            if json {
                let value: Vec<_> = results
                    .iter()
                    .map(|(project, result)| {
                        serde_json::json!({
                            "project": project,
                            "deployments": result.deployments,
                            "error": result.error,
                        })
                    })
                    .collect();
                println!("{}", report::to_json(&value)?);
            } else {
                for (project, result) in &results {
                    println!("{}\n", report::format_deployments(project, result));
                }
            }
        }
        Command::Readiness { project, json } => {
            let projects = config.select_projects(project)?;
            info!(projects = projects.len(), "Computing readiness");

            let outcomes = service.portfolio_readiness(&projects).await;
            if json {
                println!("{}", report::to_json(&outcomes)?);
            } else {
                println!("{}", report::format_readiness(&outcomes));
            }
        }
        Command::History {
            project,
            json,
            rollbacks_only,
        } => {
            let projects = config.select_projects(project)?;
            info!(
                projects = projects.len(),
                days = service.settings().history_retention_days,
                "Building deployment history"
            );

            let mut history = service.portfolio_history(&projects).await;
            if json {
                if rollbacks_only {
                    history.retain(|e| e.is_rollback);
                }
                println!("{}", report::to_json(&history)?);
            } else {
                println!("{}", report::format_history(&history, rollbacks_only));
            }
        }
    }

    Ok(())
}
