//! The four canonical step implementations the Orchestrator wires into
//! the DAG `architect -> {builder, docs} -> qa` (spec.md §4.7).

pub mod architect;
pub mod builder;
pub mod docs;
pub mod qa;

pub use architect::{ArchitectParams, ArchitectStep};
pub use builder::{BuilderParams, BuilderStep};
pub use docs::{DocsParams, DocsStep};
pub use qa::{QaParams, QaStep};
