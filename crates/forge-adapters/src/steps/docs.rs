//! `docs`: depends on `architect`, runs concurrently with `builder`.
//! Produces `outputs/README.md` and any related documentation files
//! (spec.md §4.7).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use forge_core::step::{StepKind, StepRunResultTyped, TypedStep};
use forge_core::OrchestratorError;
use forge_providers::{GenerateOptions, Message, ProviderAdapter};

use crate::artifact_store::ArtifactStore;
use crate::artifacts::{DesignDocArtifact, DocumentationSetArtifact, GeneratedFile};
use crate::llm_events::emit_llm_events;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsParams {
    #[serde(default)]
    pub project: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.1
}

impl Default for DocsParams {
    fn default() -> Self {
        Self { project: String::new(), temperature: default_temperature() }
    }
}

pub struct DocsStep {
    provider: Arc<dyn ProviderAdapter>,
    artifacts: Arc<ArtifactStore>,
}

impl DocsStep {
    pub fn new(provider: Arc<dyn ProviderAdapter>, artifacts: Arc<ArtifactStore>) -> Self {
        Self { provider, artifacts }
    }
}

#[async_trait]
impl TypedStep for DocsStep {
    type Params = DocsParams;
    type Input = DesignDocArtifact;
    type Output = DocumentationSetArtifact;

    fn id(&self) -> &'static str {
        "docs"
    }

    fn dependency(&self) -> Option<&'static str> {
        Some("architect")
    }

    fn kind(&self) -> StepKind {
        StepKind::Transform
    }

    async fn run_typed(&self, input: Option<Self::Input>, params: Self::Params) -> StepRunResultTyped<Self::Output> {
        let design = input.expect("docs requires the architect's design doc");
        let messages = vec![
            Message::system("You write end-user project documentation in Markdown."),
            Message::user(format!("Project: {}\n\nDesign document:\n{}", params.project, design.markdown)),
        ];
        let options = GenerateOptions { temperature: params.temperature, ..GenerateOptions::default() };
        let seed = format!("docs:{}", params.project);

        let outcome = match self.provider.generate(&messages, &options, &seed).await {
            Ok(outcome) => outcome,
            Err(err) => {
                emit_llm_events(&self.artifacts, "docs", &err.attempts);
                return StepRunResultTyped::Failure { error: crate::failure_to_error(err.failure) };
            }
        };
        emit_llm_events(&self.artifacts, "docs", &outcome.attempts);

        if let Err(err) = self.artifacts.write("outputs/README.md", "text/markdown", "docs", outcome.text.as_bytes()) {
            return StepRunResultTyped::Failure { error: OrchestratorError::IoError(err.to_string()) };
        }

        let files = vec![GeneratedFile { path: "README.md".to_string(), contents: outcome.text }];
        StepRunResultTyped::Success { outputs: vec![DocumentationSetArtifact { files, schema_version: 1 }] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_providers::{FakeTransport, TransportResponse};

    #[tokio::test]
    async fn writes_readme_from_design_doc() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new(vec![Ok(TransportResponse {
            text: "# widget\n\nSee design.md for details.".to_string(),
            tool_result: None,
            prompt_tokens: None,
            completion_tokens: None,
        })]));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(forge_providers::Adapter::new("fake", "fake-model", transport));
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let step = DocsStep::new(provider, artifacts);

        let design = DesignDocArtifact { markdown: "# Design\n\nUse a queue.".to_string(), schema_version: 1 };
        let params = DocsParams { project: "widget".to_string(), ..Default::default() };
        let result = step.run_typed(Some(design), params).await;
        match result {
            StepRunResultTyped::Success { outputs } => {
                assert_eq!(outputs[0].files.len(), 1);
                assert_eq!(outputs[0].files[0].path, "README.md");
            }
            StepRunResultTyped::Failure { error } => panic!("expected success, got {error:?}"),
        }
        let written = std::fs::read_to_string(dir.path().join("outputs/README.md")).unwrap();
        assert_eq!(written, "# widget\n\nSee design.md for details.");
    }
}

