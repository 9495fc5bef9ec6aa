//! Core engine errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use forge_models::FailureKind;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum OrchestratorError {
    #[error("job already completed")]
    JobCompleted,
    #[error("unknown node '{0}'")]
    UnknownNode(String),
    #[error("node already terminal")]
    NodeAlreadyTerminal,
    #[error("dependency cycle detected among: {0:?}")]
    CycleDetected(Vec<String>),
    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),
    #[error("node '{node}' declares unknown dependency '{depends_on}'")]
    UnknownDependency { node: String, depends_on: String },
    #[error("job has failed previously (stop-on-failure invariant)")]
    JobHasFailed,
    #[error("job was cancelled")]
    JobCancelled,
    #[error("provider timed out: {0}")]
    ProviderTimeout(String),
    #[error("provider rate limited: {0}")]
    ProviderRateLimit(String),
    #[error("provider returned an invalid response: {0}")]
    ProviderInvalidResponse(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("io error: {0}")]
    IoError(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl OrchestratorError {
    /// Maps an error onto the coarse-grained kind the Event Log and manifest
    /// record alongside a `Failure` (spec.md §7).
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::ProviderTimeout(_) => FailureKind::ProviderTimeout,
            Self::ProviderRateLimit(_) => FailureKind::ProviderRateLimit,
            Self::ProviderInvalidResponse(_) => FailureKind::ProviderInvalidResponse,
            Self::ValidationError(_) => FailureKind::ValidationError,
            Self::IoError(_) => FailureKind::IoError,
            Self::JobCancelled => FailureKind::Cancelled,
            Self::JobCompleted
            | Self::UnknownNode(_)
            | Self::NodeAlreadyTerminal
            | Self::CycleDetected(_)
            | Self::DuplicateNodeId(_)
            | Self::UnknownDependency { .. }
            | Self::JobHasFailed
            | Self::Internal(_) => FailureKind::Unknown,
        }
    }
}
