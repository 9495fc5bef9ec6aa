//! DAG repository (replay) and DAG definitions.
//!
//! - `DagRepository` applies the sequence of `ExecEvent`s to reconstruct
//!   state (`DagInstance`). The in-memory implementation is the reference
//!   one; `forge-runs` replays from its durable `events.jsonl` the same way.
//! - `DagDefinition` captures a DAG's nodes and their `definition_hash`.
pub mod types;

pub use types::{build_dag_definition, DagDefinition, DagInstance, DagRepository, InMemoryDagRepository, NodeSlot};
