//! The engine's neutral internal artifact representation.
//!
//! This is distinct from `forge_models::Artifact` (the on-disk record of a
//! persisted output file): this `Artifact` is the in-flight payload passed
//! between DAG nodes during execution, before the Artifact Store persists
//! whichever parts of it need to become files.
//!
//! - `payload` is generic JSON; the engine does not interpret its semantics.
//! - `hash` is computed by the engine over the canonicalized payload (see
//!   `hashing::to_canonical_json`) and used for dedup/cache lookups.
//! - `metadata` carries auxiliary information that does not enter the hash.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kinds of payload a node can produce, used to pick the right decoder
/// on the consuming side without a domain-aware engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Untyped JSON with no further structure.
    GenericJson,
    /// A single design/architecture document (architect node output).
    DesignDoc,
    /// A set of generated source files (builder node output).
    SourceFileSet,
    /// Generated documentation files (docs node output).
    DocumentationSet,
    /// A QA pass/fail report (qa node output).
    QaReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub hash: String,
    pub payload: Value,
    pub metadata: Option<Value>,
}

impl Artifact {
    /// Internal constructor; prefer building artifacts via
    /// `ArtifactSpec::into_artifact`.
    pub(crate) fn new_unhashed(kind: ArtifactKind, payload: Value, metadata: Option<Value>) -> Self {
        Self { kind, hash: String::new(), payload, metadata }
    }
}
