//! Execution event kinds and the `ExecEvent` envelope.
//!
//! Each `DagEngine` run emits events to an `EventStore`, an append-only log
//! distinct from (and internal to) the engine — it is what `DagRepository`
//! replays to reconstruct node state, not the job-facing Event Log that
//! `forge-runs` persists to `events.jsonl` (spec.md §4.2). `ExecEventKind`
//! is the stable, observable contract of the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::OrchestratorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecEventKind {
    /// The first event for a `job_id`: fixes the DAG definition hash and
    /// node count.
    JobInitialized { definition_hash: String, node_count: usize },
    /// A node began execution. Does not imply success.
    NodeStarted { node_id: String },
    /// A node finished successfully, with its output hashes and fingerprint.
    NodeFinished { node_id: String, outputs: Vec<String>, fingerprint: String },
    /// A node's output was served from the Cache rather than re-executed.
    NodeCached { node_id: String, outputs: Vec<String>, fingerprint: String },
    /// The Cache held a response for this node's fingerprint (spec.md §4.3).
    /// Always paired with a following `NodeCached`.
    CacheHit { node_id: String, fingerprint: String },
    /// The Cache had no response for this node's fingerprint; the node will
    /// actually execute.
    CacheMiss { node_id: String, fingerprint: String },
    /// A node terminated with a non-retryable error.
    NodeFailed { node_id: String, error: OrchestratorError, fingerprint: String },
    /// A node was skipped because an upstream dependency failed or was
    /// cancelled (spec.md §3 invariant 5).
    NodeSkipped { node_id: String, upstream: String },
    /// A retry was scheduled for a node currently `Failed`, incrementing its
    /// retry counter. Applied during replay as Failed -> Pending.
    RetryScheduled { node_id: String, retry_index: u32, reason: Option<String> },
    /// Closing event with the aggregate fingerprint of the whole job (hash
    /// of the ordered fingerprints of its successful nodes).
    JobCompleted { job_fingerprint: String },
    /// The job was cancelled before reaching a terminal state.
    JobCancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecEvent {
    /// Assigned by the `EventStore` in append order.
    pub seq: u64,
    pub job_id: Uuid,
    pub kind: ExecEventKind,
    /// Metadata only; does not enter any fingerprint.
    pub ts: DateTime<Utc>,
}
