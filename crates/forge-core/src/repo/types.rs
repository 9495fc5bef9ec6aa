//! Repository types: reconstructed state (`DagInstance`) and definition
//! (`DagDefinition`).
//!
//! The repository replays events in order and rebuilds an immutable
//! `DagInstance` per event; it stores only output hashes (not full
//! artifacts) to stay neutral — the Cache/Artifact Store own the bytes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::OrchestratorError;
use crate::event::{ExecEvent, ExecEventKind};
use crate::step::{NodeStatus, StepDefinition};

pub struct DagInstance {
    pub id: Uuid,
    pub nodes: Vec<NodeSlot>,
    pub completed: bool,
    pub cancelled: bool,
}

impl DagInstance {
    pub fn slot(&self, node_id: &str) -> Option<&NodeSlot> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    /// Nodes whose status is `Pending` and whose dependencies have all
    /// reached a success-equivalent state (spec.md §4.6 scheduling rule 1).
    pub fn ready_nodes<'a>(&'a self, definition: &'a DagDefinition) -> Vec<&'a str> {
        let mut ready: Vec<&str> = definition
            .nodes
            .iter()
            .filter(|n| {
                let slot = self.slot(n.id()).expect("every definition node has a slot");
                if slot.status != NodeStatus::Pending {
                    return false;
                }
                n.dependencies().iter().all(|dep| {
                    self.slot(dep.as_str()).map(|s| matches!(s.status, NodeStatus::Succeeded | NodeStatus::Cached)).unwrap_or(false)
                })
            })
            .map(|n| n.id())
            .collect();
        // Deterministic tie-break: lexicographic by node id (spec.md §4.6).
        ready.sort_unstable();
        ready
    }

    /// Pending nodes blocked by an upstream dependency that has already
    /// failed or been skipped, paired with the offending dependency id
    /// (first such dependency in lexicographic order, for a deterministic
    /// `NodeSkipped.upstream`).
    pub fn blocked_nodes<'a>(&'a self, definition: &'a DagDefinition) -> Vec<(&'a str, &'a str)> {
        let mut blocked: Vec<(&str, &str)> = definition
            .nodes
            .iter()
            .filter_map(|n| {
                let slot = self.slot(n.id())?;
                if slot.status != NodeStatus::Pending {
                    return None;
                }
                let mut deps: Vec<String> = n.dependencies();
                deps.sort_unstable();
                deps.iter().find_map(|dep| {
                    self.slot(dep.as_str()).filter(|s| matches!(s.status, NodeStatus::Failed | NodeStatus::Skipped)).map(|_| (n.id(), dep.as_str()))
                })
            })
            .collect();
        blocked.sort_unstable_by_key(|(id, _)| *id);
        blocked
    }

    /// Nodes left `Running` with no terminal event for them — the engine
    /// process that owned them did not reach a terminal event before this
    /// replay, so they are safe to re-admit (spec.md §7 resume semantics).
    pub fn stale_running<'a>(&'a self, definition: &'a DagDefinition) -> Vec<&'a str> {
        let mut stale: Vec<&str> = definition
            .nodes
            .iter()
            .filter(|n| self.slot(n.id()).map(|s| s.status == NodeStatus::Running).unwrap_or(false))
            .map(|n| n.id())
            .collect();
        stale.sort_unstable();
        stale
    }
}

/// Per-node reconstructed state.
pub struct NodeSlot {
    pub node_id: String,
    pub status: NodeStatus,
    pub fingerprint: Option<String>,
    pub outputs: Vec<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: u32,
    pub retry_count: u32,
}

/// Reconstructs (replays) a job's state from its event log.
pub trait DagRepository {
    fn load(&self, job_id: Uuid, events: &[ExecEvent], definition: &DagDefinition) -> DagInstance;
}

/// Immutable DAG definition: nodes plus their dependency edges.
///
/// Nodes are `Arc`-owned rather than borrowed so a node can be cloned into
/// a `tokio::task::JoinSet`-spawned, `'static` future (spec.md §4.6).
#[derive(Clone)]
pub struct DagDefinition {
    pub nodes: Vec<Arc<dyn StepDefinition>>,
    pub definition_hash: String,
}

impl DagDefinition {
    pub fn new(nodes: Vec<Arc<dyn StepDefinition>>, definition_hash: String) -> Self {
        Self { nodes, definition_hash }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&dyn StepDefinition> {
        self.nodes.iter().find(|n| n.id() == id).map(|n| n.as_ref())
    }

    /// The `Arc` handle for a node, for callers that need to move an owned
    /// reference into a spawned task.
    pub fn node_arc(&self, id: &str) -> Option<Arc<dyn StepDefinition>> {
        self.nodes.iter().find(|n| n.id() == id).cloned()
    }

    /// Validates invariant 3 (spec.md §3): unique node ids, every declared
    /// dependency exists, and the dependency graph is acyclic.
    pub fn validate(&self) -> Result<(), OrchestratorError> {
        let mut seen = HashSet::new();
        for n in &self.nodes {
            if !seen.insert(n.id()) {
                return Err(OrchestratorError::DuplicateNodeId(n.id().to_string()));
            }
        }
        for n in &self.nodes {
            for dep in n.dependencies() {
                if self.node(&dep).is_none() {
                    return Err(OrchestratorError::UnknownDependency { node: n.id().to_string(), depends_on: dep });
                }
            }
        }
        detect_cycle(self)
    }
}

fn detect_cycle(def: &DagDefinition) -> Result<(), OrchestratorError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }
    let mut marks: HashMap<String, Mark> = def.nodes.iter().map(|n| (n.id().to_string(), Mark::Unvisited)).collect();

    fn visit(
        node: &str,
        def: &DagDefinition,
        marks: &mut HashMap<String, Mark>,
        stack: &mut Vec<String>,
    ) -> Result<(), OrchestratorError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                stack.push(node.to_string());
                return Err(OrchestratorError::CycleDetected(stack.clone()));
            }
            _ => {}
        }
        marks.insert(node.to_string(), Mark::Visiting);
        stack.push(node.to_string());
        if let Some(def_node) = def.node(node) {
            for dep in def_node.dependencies() {
                visit(&dep, def, marks, stack)?;
            }
        }
        stack.pop();
        marks.insert(node.to_string(), Mark::Done);
        Ok(())
    }

    for n in &def.nodes {
        let mut stack = Vec::new();
        visit(n.id(), def, &mut marks, &mut stack)?;
    }
    Ok(())
}

impl std::fmt::Debug for DagDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.nodes.iter().map(|n| n.id()).collect();
        f.debug_struct("DagDefinition").field("definition_hash", &self.definition_hash).field("node_ids", &ids).finish()
    }
}

pub struct InMemoryDagRepository;

impl InMemoryDagRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for InMemoryDagRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DagRepository for InMemoryDagRepository {
    fn load(&self, job_id: Uuid, events: &[ExecEvent], definition: &DagDefinition) -> DagInstance {
        let mut nodes: Vec<NodeSlot> = definition
            .nodes
            .iter()
            .map(|n| NodeSlot {
                node_id: n.id().to_string(),
                status: NodeStatus::Pending,
                fingerprint: None,
                outputs: vec![],
                started_at: None,
                finished_at: None,
                attempts: 0,
                retry_count: 0,
            })
            .collect();
        let mut completed = false;
        let mut cancelled = false;

        for ev in events {
            match &ev.kind {
                ExecEventKind::JobInitialized { .. } => {}
                ExecEventKind::NodeStarted { node_id } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        slot.status = NodeStatus::Running;
                        slot.started_at = Some(ev.ts);
                        slot.attempts += 1;
                    }
                }
                ExecEventKind::NodeFinished { node_id, outputs, fingerprint } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        slot.status = NodeStatus::Succeeded;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.outputs = outputs.clone();
                        slot.finished_at = Some(ev.ts);
                    }
                }
                ExecEventKind::NodeCached { node_id, outputs, fingerprint } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        slot.status = NodeStatus::Cached;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.outputs = outputs.clone();
                        slot.finished_at = Some(ev.ts);
                    }
                }
                ExecEventKind::NodeFailed { node_id, fingerprint, .. } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        slot.status = NodeStatus::Failed;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                ExecEventKind::NodeSkipped { node_id, .. } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        slot.status = NodeStatus::Skipped;
                        slot.finished_at = Some(ev.ts);
                    }
                }
                // Replaying a scheduled retry moves a Failed node back to
                // Pending, consistent with the stored retry counter.
                ExecEventKind::RetryScheduled { node_id, retry_index, .. } => {
                    if let Some(slot) = nodes.iter_mut().find(|s| &s.node_id == node_id) {
                        if slot.status == NodeStatus::Failed && *retry_index == slot.retry_count + 1 {
                            slot.retry_count = *retry_index;
                            slot.status = NodeStatus::Pending;
                        }
                    }
                }
                ExecEventKind::JobCompleted { .. } => completed = true,
                ExecEventKind::JobCancelled => cancelled = true,
                ExecEventKind::CacheHit { .. } | ExecEventKind::CacheMiss { .. } => {}
            }
        }

        DagInstance { id: job_id, nodes, completed, cancelled }
    }
}

/// Builds a `DagDefinition` from nodes, hashing their ids and per-node
/// definition hashes together for a content-addressed `definition_hash`.
pub fn build_dag_definition(nodes: Vec<Arc<dyn StepDefinition>>) -> Result<DagDefinition, OrchestratorError> {
    use crate::hashing::{hash_str, to_canonical_json};
    use serde_json::json;

    let node_ids: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
    let node_hashes: Vec<String> = nodes.iter().map(|n| n.definition_hash()).collect();
    let ids_json = json!({ "node_ids": node_ids, "node_definition_hashes": node_hashes });
    let definition_hash = hash_str(&to_canonical_json(&ids_json));

    let def = DagDefinition::new(nodes, definition_hash);
    def.validate()?;
    Ok(def)
}
