//! `StepResult` — per-step outcome (spec.md §3, §4.6 state machine).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{artifact::Artifact, failure::Failure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
    Cached,
}

impl StepStatus {
    /// Terminal, success-equivalent states a dependent step can build on
    /// (spec.md §4.6 scheduling step 1).
    pub fn is_success_equivalent(self) -> bool {
        matches!(self, Self::Succeeded | Self::Cached | Self::Skipped)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Cached | Self::Skipped | Self::Failed)
    }

    /// Invariant 2 (spec.md §3): monotonic, no reverse transitions.
    pub fn can_transition_to(self, next: Self) -> bool {
        use StepStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Skipped)
                | (Pending, Failed)
                | (Running, Succeeded)
                | (Running, Cached)
                | (Running, Failed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_s: Option<f64>,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Opaque payload handed to downstream steps (spec.md §9: discriminated
    /// variant via the `kind` tag embedded in the JSON itself).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub retry_count: u32,
}

impl StepResult {
    pub fn pending(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            duration_s: None,
            artifacts: Vec::new(),
            failure: None,
            output: None,
            retry_count: 0,
        }
    }

    /// Applies a transition, returning an error message if it would violate
    /// invariant 2 rather than panicking — callers (the DAG Executor) decide
    /// how to surface that as an `unknown` Failure.
    pub fn transition(&mut self, next: StepStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!("illegal step transition {:?} -> {:?} for '{}'", self.status, next, self.step_name));
        }
        self.status = next;
        Ok(())
    }
}
