//! Neutral contract for a DAG node.
//!
//! Key rules:
//! - Deterministic given the same `ExecutionContext` (dependency outputs +
//!   params).
//! - `dependencies()` lists the node ids this node reads from; a node with
//!   no dependencies is a DAG source.
//! - No side effects observable to the engine beyond its return value —
//!   logging and artifact persistence happen in the engine/Artifact Store,
//!   not inside a node's `run`.

use async_trait::async_trait;
use serde_json::Value;

use super::run_result::StepRunResult;
use crate::hashing::{hash_str, to_canonical_json};
use crate::model::ExecutionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Source,
    Transform,
    Sink,
    Check,
}

#[async_trait]
pub trait StepDefinition: Send + Sync {
    fn id(&self) -> &str;

    /// Friendly display name; defaults to `id()`.
    fn name(&self) -> &str {
        self.id()
    }

    /// Node ids this node reads from. Empty for a DAG source.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Deterministic default params, merged with overrides by the engine's
    /// param injectors.
    fn base_params(&self) -> Value;

    /// General category of the node.
    fn kind(&self) -> StepKind;

    /// Whether the DAG Executor's retry policy applies to this node on
    /// failure (spec.md §7). `qa` nodes set this to `false`.
    fn retryable(&self) -> bool {
        true
    }

    /// Per-step deadline the DAG Executor enforces around `run()` (spec.md
    /// §4.6). Matches `GenerateOptions`'s own default `timeout_s` since most
    /// nodes spend their time inside a single provider call.
    fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(120)
    }

    /// Hash identifying this node's shape (id, kind, dependencies) for the
    /// DAG definition hash. Does not include `base_params` — params enter
    /// the per-execution fingerprint instead, so tuning them doesn't
    /// require redefining the whole DAG.
    fn definition_hash(&self) -> String {
        let shape = serde_json::json!({
            "id": self.id(),
            "kind": format!("{:?}", self.kind()),
            "dependencies": self.dependencies(),
        });
        hash_str(&to_canonical_json(&shape))
    }

    /// Runs the node. Must depend only on `ctx.inputs` and `ctx.params`.
    async fn run(&self, ctx: &ExecutionContext) -> StepRunResult;
}
