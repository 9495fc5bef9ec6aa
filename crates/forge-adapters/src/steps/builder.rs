//! `builder`: depends on `architect`. Calls the Provider Adapter's
//! `tool_call` to generate source files from the design document, then
//! writes each one through the Artifact Store (spec.md §4.7).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use forge_core::step::{StepKind, StepRunResultTyped, TypedStep};
use forge_core::OrchestratorError;
use forge_providers::{GenerateOptions, ProviderAdapter};

use crate::artifact_store::ArtifactStore;
use crate::artifacts::{DesignDocArtifact, GeneratedFile, SourceFileSetArtifact};
use crate::llm_events::emit_llm_events;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderParams {
    #[serde(default)]
    pub project: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.1
}

impl Default for BuilderParams {
    fn default() -> Self {
        Self { project: String::new(), temperature: default_temperature() }
    }
}

pub struct BuilderStep {
    provider: Arc<dyn ProviderAdapter>,
    artifacts: Arc<ArtifactStore>,
}

impl BuilderStep {
    pub fn new(provider: Arc<dyn ProviderAdapter>, artifacts: Arc<ArtifactStore>) -> Self {
        Self { provider, artifacts }
    }
}

#[async_trait]
impl TypedStep for BuilderStep {
    type Params = BuilderParams;
    type Input = DesignDocArtifact;
    type Output = SourceFileSetArtifact;

    fn id(&self) -> &'static str {
        "builder"
    }

    fn dependency(&self) -> Option<&'static str> {
        Some("architect")
    }

    fn kind(&self) -> StepKind {
        StepKind::Transform
    }

    async fn run_typed(&self, input: Option<Self::Input>, params: Self::Params) -> StepRunResultTyped<Self::Output> {
        let design = input.expect("builder requires the architect's design doc");
        let arguments = json!({
            "design_markdown": design.markdown,
            "schema": {
                "type": "object",
                "properties": {
                    "files": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": { "path": {"type": "string"}, "contents": {"type": "string"} },
                            "required": ["path", "contents"],
                        },
                    },
                },
                "required": ["files"],
            },
        });
        let options = GenerateOptions { temperature: params.temperature, ..GenerateOptions::default() };
        let seed = format!("builder:{}", params.project);

        let outcome = match self.provider.tool_call("emit_source_files", &arguments, &options, &seed).await {
            Ok(outcome) => outcome,
            Err(err) => {
                emit_llm_events(&self.artifacts, "builder", &err.attempts);
                return StepRunResultTyped::Failure { error: crate::failure_to_error(err.failure) };
            }
        };
        emit_llm_events(&self.artifacts, "builder", &outcome.attempts);

        let files: Vec<GeneratedFile> = match outcome.tool_result.and_then(|v| v.get("files").cloned()).map(serde_json::from_value) {
            Some(Ok(files)) => files,
            _ => {
                return StepRunResultTyped::Failure {
                    error: OrchestratorError::ProviderInvalidResponse("builder tool_call did not return a `files` array".to_string()),
                }
            }
        };
        if files.is_empty() {
            return StepRunResultTyped::Failure {
                error: OrchestratorError::ProviderInvalidResponse("builder produced no source files".to_string()),
            };
        }

        for file in &files {
            let media_type = media_type_for(&file.path);
            if let Err(err) = self.artifacts.write(&format!("outputs/{}", file.path), media_type, "builder", file.contents.as_bytes()) {
                return StepRunResultTyped::Failure { error: OrchestratorError::IoError(err.to_string()) };
            }
        }

        StepRunResultTyped::Success { outputs: vec![SourceFileSetArtifact { files, schema_version: 1 }] }
    }
}

fn media_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("py") => "text/x-python",
        Some("rs") => "text/rust",
        Some("json") => "application/json",
        Some("toml") => "application/toml",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_providers::{FakeTransport, TransportResponse};

    fn design() -> DesignDocArtifact {
        DesignDocArtifact { markdown: "# Design\n\nOne module, `main.py`.".to_string(), schema_version: 1 }
    }

    #[tokio::test]
    async fn writes_each_generated_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool_result = json!({
            "files": [
                {"path": "main.py", "contents": "print('hi')"},
                {"path": "Cargo.toml", "contents": "[package]\nname = \"widget\"\n"},
            ]
        });
        let transport = Arc::new(FakeTransport::new(vec![Ok(TransportResponse {
            text: String::new(),
            tool_result: Some(tool_result),
            prompt_tokens: None,
            completion_tokens: None,
        })]));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(forge_providers::Adapter::new("fake", "fake-model", transport));
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let step = BuilderStep::new(provider, artifacts);

        let params = BuilderParams { project: "widget".to_string(), ..Default::default() };
        let result = step.run_typed(Some(design()), params).await;
        match result {
            StepRunResultTyped::Success { outputs } => {
                assert_eq!(outputs[0].files.len(), 2);
            }
            StepRunResultTyped::Failure { error } => panic!("expected success, got {error:?}"),
        }
        assert_eq!(std::fs::read_to_string(dir.path().join("outputs/main.py")).unwrap(), "print('hi')");
        assert!(dir.path().join("outputs/Cargo.toml").exists());
    }

    #[tokio::test]
    async fn fails_when_tool_result_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(FakeTransport::new(vec![Ok(TransportResponse {
            text: String::new(),
            tool_result: Some(json!({"unrelated": true})),
            prompt_tokens: None,
            completion_tokens: None,
        })]));
        let provider: Arc<dyn ProviderAdapter> = Arc::new(forge_providers::Adapter::new("fake", "fake-model", transport));
        let artifacts = Arc::new(ArtifactStore::new(dir.path()));
        let step = BuilderStep::new(provider, artifacts);

        let result = step.run_typed(Some(design()), BuilderParams::default()).await;
        match result {
            StepRunResultTyped::Failure { error } => assert!(matches!(error, OrchestratorError::ProviderInvalidResponse(_))),
            StepRunResultTyped::Success { .. } => panic!("expected failure"),
        }
    }
}
