//! forge-adapters: the filesystem Artifact Store plus the four canonical
//! step implementations (architect/builder/docs/qa) the Orchestrator wires
//! into a DAG (spec.md §4.1, §4.7). Generalizes the teacher's
//! `chem-adapters` role (domain-to-core artifact packaging and concrete
//! step implementations) from chemistry-pipeline steps to LLM-driven
//! code-generation steps.

pub mod artifact_store;
pub mod artifacts;
pub mod injectors;
pub mod llm_events;
pub mod steps;

pub use artifact_store::{ArtifactStore, ArtifactStoreError, WriteOutcome};
pub use injectors::JobSpecInjector;
pub use llm_events::emit_llm_events;

use forge_core::OrchestratorError;
use forge_models::{Failure, FailureKind};

/// Maps a `ProviderAdapter` failure onto the node-run error type, preserving
/// the failure kind so the DAG Executor's retry policy and the eventual
/// manifest `Failure` record agree (spec.md §7).
pub fn failure_to_error(failure: Failure) -> OrchestratorError {
    match failure.kind {
        FailureKind::ProviderTimeout => OrchestratorError::ProviderTimeout(failure.message),
        FailureKind::ProviderRateLimit => OrchestratorError::ProviderRateLimit(failure.message),
        FailureKind::ProviderInvalidResponse => OrchestratorError::ProviderInvalidResponse(failure.message),
        FailureKind::ValidationError => OrchestratorError::ValidationError(failure.message),
        FailureKind::IoError => OrchestratorError::IoError(failure.message),
        FailureKind::Cancelled => OrchestratorError::JobCancelled,
        FailureKind::DependencyFailed | FailureKind::Unknown => OrchestratorError::Internal(failure.message),
    }
}
