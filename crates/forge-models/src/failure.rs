//! `Failure` — typed error attached to a terminal `StepResult` (spec.md §3, §7).

use serde::{Deserialize, Serialize};

/// The only error kinds the core distinguishes (spec.md §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ProviderTimeout,
    ProviderRateLimit,
    ProviderInvalidResponse,
    ValidationError,
    IoError,
    DependencyFailed,
    Cancelled,
    Unknown,
}

impl FailureKind {
    /// Whether the Provider Adapter / DAG Executor retry policy applies.
    ///
    /// `IoError` is retryable only for network faults; callers that know
    /// they are looking at a permission/disk error should not retry even
    /// though this returns `true` for the kind in general — see spec.md §7.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ProviderTimeout | Self::ProviderRateLimit | Self::IoError)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_step: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), retry_count: None, upstream_step: None }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    /// A synthetic `dependency_failed` failure. Invariant 5 (spec.md §3)
    /// requires the upstream step to itself be failed or cancelled; that is
    /// enforced by the DAG Executor, not here.
    pub fn dependency_failed(upstream_step: impl Into<String>) -> Self {
        let upstream_step = upstream_step.into();
        Self {
            kind: FailureKind::DependencyFailed,
            message: format!("upstream step '{upstream_step}' did not succeed"),
            retry_count: None,
            upstream_step: Some(upstream_step),
        }
    }
}
