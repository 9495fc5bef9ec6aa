//! Typed artifacts produced by the four canonical steps. Each wraps the
//! neutral `forge_core::model::Artifact` payload with a concrete shape via
//! `ArtifactSpec`, so a downstream node decodes its dependency's output
//! without the engine knowing any of this domain's semantics.

use forge_core::model::{ArtifactKind, ArtifactSpec};
use forge_core::typed_artifact;
use serde::{Deserialize, Serialize};

/// Placeholder input type for source nodes (`architect`), which never
/// decode an upstream artifact but still need a concrete `TypedStep::Input`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoInput;

impl ArtifactSpec for NoInput {
    const KIND: ArtifactKind = ArtifactKind::GenericJson;
}

/// One generated file, used by both `builder` and `docs` outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub contents: String,
}

typed_artifact!(DesignDocArtifact {
    markdown: String,
} kind: ArtifactKind::DesignDoc);

typed_artifact!(SourceFileSetArtifact {
    files: Vec<GeneratedFile>,
} kind: ArtifactKind::SourceFileSet);

typed_artifact!(DocumentationSetArtifact {
    files: Vec<GeneratedFile>,
} kind: ArtifactKind::DocumentationSet);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaFinding {
    pub check: String,
    pub passed: bool,
    pub detail: String,
}

typed_artifact!(QaReportArtifact {
    passed: bool,
    findings: Vec<QaFinding>,
} kind: ArtifactKind::QaReport);
