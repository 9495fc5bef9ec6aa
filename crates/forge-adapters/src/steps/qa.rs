//! `qa`: depends on both `builder` and `docs`. Validates the produced
//! artifacts deterministically (no Provider Adapter call, per spec.md §4.7
//! — a validation failure must reproduce identically, so `qa` never
//! retries) and writes `outputs/qa_report.md`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use forge_core::model::{ArtifactSpec, ExecutionContext};
use forge_core::step::{StepDefinition, StepKind, StepRunResult};
use forge_core::OrchestratorError;

use crate::artifact_store::ArtifactStore;
use crate::artifacts::{DocumentationSetArtifact, GeneratedFile, QaFinding, QaReportArtifact, SourceFileSetArtifact};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaParams {
    #[serde(default)]
    pub project: String,
}

pub struct QaStep {
    artifacts: Arc<ArtifactStore>,
}

impl QaStep {
    pub fn new(artifacts: Arc<ArtifactStore>) -> Self {
        Self { artifacts }
    }
}

#[async_trait]
impl StepDefinition for QaStep {
    fn id(&self) -> &str {
        "qa"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["builder".to_string(), "docs".to_string()]
    }

    fn base_params(&self) -> Value {
        serde_json::to_value(QaParams::default()).expect("serialize qa default params")
    }

    fn kind(&self) -> StepKind {
        StepKind::Check
    }

    fn retryable(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &ExecutionContext) -> StepRunResult {
        let source = match ctx.input_typed_named::<SourceFileSetArtifact>("builder") {
            Ok(typed) => typed.inner,
            Err(message) => return StepRunResult::Failure { error: OrchestratorError::ValidationError(message) },
        };
        let docs = match ctx.input_typed_named::<DocumentationSetArtifact>("docs") {
            Ok(typed) => typed.inner,
            Err(message) => return StepRunResult::Failure { error: OrchestratorError::ValidationError(message) },
        };

        let mut findings = vec![
            QaFinding {
                check: "source_files_present".to_string(),
                passed: !source.files.is_empty(),
                detail: format!("{} source file(s) produced", source.files.len()),
            },
            QaFinding {
                check: "readme_present".to_string(),
                passed: docs.files.iter().any(|f| f.path == "README.md"),
                detail: "README.md must be among the docs output".to_string(),
            },
        ];
        findings.extend(source.files.iter().map(syntax_check));

        let passed = findings.iter().all(|f| f.passed);
        let report_md = render_report(&findings, passed);
        if let Err(err) = self.artifacts.write("outputs/qa_report.md", "text/markdown", "qa", report_md.as_bytes()) {
            return StepRunResult::Failure { error: OrchestratorError::IoError(err.to_string()) };
        }

        let report = QaReportArtifact { passed, findings, schema_version: 1 };
        StepRunResult::Success { outputs: vec![report.into_artifact()] }
    }
}

/// A minimal syntactic check: balanced parens/braces. Real language parsing
/// is an external step implementation's concern, not this core's.
fn syntax_check(file: &GeneratedFile) -> QaFinding {
    let balanced = file.contents.matches('(').count() == file.contents.matches(')').count()
        && file.contents.matches('{').count() == file.contents.matches('}').count();
    QaFinding {
        check: format!("syntax:{}", file.path),
        passed: balanced,
        detail: if balanced { "balanced brackets".to_string() } else { "unbalanced brackets".to_string() },
    }
}

fn render_report(findings: &[QaFinding], passed: bool) -> String {
    let mut out = format!("# QA Report\n\nOverall: {}\n\n", if passed { "PASS" } else { "FAIL" });
    for f in findings {
        out.push_str(&format!("- [{}] {}: {}\n", if f.passed { "x" } else { " " }, f.check, f.detail));
    }
    out
}
