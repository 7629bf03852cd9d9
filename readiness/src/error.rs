//! Readiness error types
//!
//! Only orchestration-level failures surface as errors. Missing artifacts,
//! files and merge requests are `None`; malformed text parses to `None` or
//! an empty list.

use thiserror::Error;

use crate::host::HostError;

/// Result type alias for readiness operations
pub type ReadinessResult<T> = Result<T, ReadinessError>;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// A host call failed while computing a project's readiness
    #[error("project {project_id}: {operation} failed: {source}")]
    Host {
        project_id: u64,
        operation: &'static str,
        #[source]
        source: HostError,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ReadinessError {
    /// Create a host error with the failing operation recorded
    pub fn host(project_id: u64, operation: &'static str, source: HostError) -> Self {
        Self::Host {
            project_id,
            operation,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a user-initiated refresh might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Host { source, .. } => source.is_retryable(),
            Self::Config { .. } => false,
        }
    }
}
