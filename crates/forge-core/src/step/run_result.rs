//! Result of running a single DAG node.

use crate::{errors::OrchestratorError, model::Artifact};

/// Neutral result of running a node.
pub enum StepRunResult {
    Success { outputs: Vec<Artifact> },
    Failure { error: OrchestratorError },
}
