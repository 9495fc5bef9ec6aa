//! `architect`: the DAG source. Calls the Provider Adapter once to turn a
//! job's task description into a design document, then persists it through
//! the Artifact Store (spec.md §4.7).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use forge_core::step::{StepKind, StepRunResultTyped, TypedStep};
use forge_core::OrchestratorError;
use forge_providers::{GenerateOptions, Message, ProviderAdapter};

use crate::artifact_store::ArtifactStore;
use crate::artifacts::{DesignDocArtifact, NoInput};
use crate::llm_events::emit_llm_events;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectParams {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub task_description: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.1
}

impl Default for ArchitectParams {
    fn default() -> Self {
        Self { project: String::new(), task_description: String::new(), temperature: default_temperature() }
    }
}

pub struct ArchitectStep {
    provider: Arc<dyn ProviderAdapter>,
    artifacts: Arc<ArtifactStore>,
}

impl ArchitectStep {
    pub fn new(provider: Arc<dyn ProviderAdapter>, artifacts: Arc<ArtifactStore>) -> Self {
        Self { provider, artifacts }
    }
}

#[async_trait]
impl TypedStep for ArchitectStep {
    type Params = ArchitectParams;
    type Input = NoInput;
    type Output = DesignDocArtifact;

    fn id(&self) -> &'static str {
        "architect"
    }

    fn kind(&self) -> StepKind {
        StepKind::Source
    }

    async fn run_typed(&self, _input: Option<Self::Input>, params: Self::Params) -> StepRunResultTyped<Self::Output> {
        let messages = vec![
            Message::system("You are a software architect. Produce a concise design document in Markdown."),
            Message::user(format!("Project: {}\nTask: {}", params.project, params.task_description)),
        ];
        let options = GenerateOptions { temperature: params.temperature, ..GenerateOptions::default() };
        let seed = format!("architect:{}", params.project);

        let outcome = match self.provider.generate(&messages, &options, &seed).await {
            Ok(outcome) => outcome,
            Err(err) => {
                emit_llm_events(&self.artifacts, "architect", &err.attempts);
                return StepRunResultTyped::Failure { error: crate::failure_to_error(err.failure) };
            }
        };
        emit_llm_events(&self.artifacts, "architect", &outcome.attempts);

        match self.artifacts.write("outputs/design.md", "text/markdown", "architect", outcome.text.as_bytes()) {
            Ok(_) => StepRunResultTyped::Success { outputs: vec![DesignDocArtifact { markdown: outcome.text, schema_version: 1 }] },
            Err(err) => StepRunResultTyped::Failure { error: OrchestratorError::IoError(err.to_string()) },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_providers::{FakeTransport, TransportError, TransportResponse};

    fn outcome_text(text: &str) -> TransportResponse {
        TransportResponse { text: text.to_string(), tool_result: None, prompt_tokens: None, completion_tokens: None }
    }

    #[tokio::test]
    async fn writes_design_doc_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new(vec![Ok(outcome_text("# Design\n\nUse a queue."))]));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(forge_providers::Adapter::new("fake", "fake-model", transport));
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let step = ArchitectStep::new(provider, artifacts.clone());

        let params = ArchitectParams { project: "widget".to_string(), task_description: "build a queue".to_string(), ..Default::default() };
        let result = step.run_typed(None, params).await;
        match result {
            StepRunResultTyped::Success { outputs } => {
                assert_eq!(outputs[0].markdown, "# Design\n\nUse a queue.");
            }
            StepRunResultTyped::Failure { error } => panic!("expected success, got {error:?}"),
        }
        let written = std::fs::read_to_string(dir.path().join("outputs/design.md")).unwrap();
        assert_eq!(written, "# Design\n\nUse a queue.");
    }

    #[tokio::test]
    async fn maps_provider_failure_to_orchestrator_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new(vec![Err(TransportError::InvalidResponse("no luck".to_string()))]));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(forge_providers::Adapter::new("fake", "fake-model", transport));
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let step = ArchitectStep::new(provider, artifacts);

        let result = step.run_typed(None, ArchitectParams::default()).await;
        match result {
            StepRunResultTyped::Failure { error } => {
                assert!(matches!(error, OrchestratorError::ProviderInvalidResponse(_)));
            }
            StepRunResultTyped::Success { .. } => panic!("expected failure"),
        }
    }
}
