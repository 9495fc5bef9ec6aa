//! `DagEngine`: bounded-concurrency DAG executor.
//!
//! Generalizes the teacher's `FlowEngine` (a single linear cursor) to a
//! per-node status map driven by a `tokio::sync::Semaphore`-bounded
//! admission loop over a `tokio::task::JoinSet`. Each admitted wave:
//!
//! 1. Replays the event log into a `DagInstance` (`DagRepository::load`).
//! 2. Computes ready nodes (all dependencies success-equivalent), blocked
//!    nodes (a dependency failed or was skipped), and stale-running nodes
//!    left over from a crashed process, in that priority order.
//! 3. Emits `NodeSkipped` for blocked nodes immediately (no execution).
//! 4. Admits ready/stale nodes up to the concurrency limit, checking the
//!    cache first; a hit emits `NodeCached`, a miss spawns the node's
//!    `run()` onto the `JoinSet`.
//! 5. Awaits the next completion, emits `NodeFinished`/`NodeFailed` (or
//!    `RetryScheduled` when the node is retryable and under its retry
//!    budget), and loops until every node is terminal.
//!
//! Node ordering ties are broken lexicographically by node id
//! (`DagInstance::ready_nodes`/`blocked_nodes`).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::cache::{InMemoryNodeCache, NodeCache};
use crate::constants::ENGINE_VERSION;
use crate::engine::DagEngineBuilder;
use crate::errors::OrchestratorError;
use crate::event::{EventStore, ExecEvent, ExecEventKind};
use crate::hashing::hash_value;
use crate::injection::{CompositeInjector, ParamInjector};
use crate::model::{Artifact, ExecutionContext, NodeFingerprintInput};
use crate::repo::{DagDefinition, DagInstance, DagRepository};
use crate::step::{StepDefinition, StepRunResult};

/// Orchestrates the execution of a single DAG for a single job.
pub struct DagEngine<E, R>
where
    E: EventStore,
    R: DagRepository,
{
    event_store: E,
    repository: R,
    artifact_store: std::collections::HashMap<String, Artifact>,
    cache: Box<dyn NodeCache>,
    injectors: Vec<Box<dyn ParamInjector>>,
    max_concurrency: usize,
    max_retries: u32,
    default_job_id: Option<Uuid>,
    default_definition: Option<DagDefinition>,
    /// Checked once per admission pass; when set, `run_job` appends
    /// `JobCancelled` and stops admitting new nodes (spec.md §4.6). Nodes
    /// already in flight are left to finish or hit their own timeout.
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl<E, R> DagEngine<E, R>
where
    E: EventStore,
    R: DagRepository,
{
    #[inline]
    pub fn builder(event_store: E, repository: R) -> DagEngineBuilder<E, R> {
        DagEngineBuilder { event_store, repository, nodes: Vec::new() }
    }

    #[inline]
    pub fn new() -> DagEngineBuilder<crate::event::InMemoryEventStore, crate::repo::InMemoryDagRepository> {
        DagEngineBuilder {
            event_store: crate::event::InMemoryEventStore::default(),
            repository: crate::repo::InMemoryDagRepository::new(),
            nodes: Vec::new(),
        }
    }

    pub fn new_with_stores(event_store: E, repository: R) -> Self {
        Self {
            event_store,
            repository,
            artifact_store: std::collections::HashMap::new(),
            cache: Box::new(InMemoryNodeCache::new()),
            injectors: Vec::new(),
            max_concurrency: 4,
            max_retries: 2,
            default_job_id: None,
            default_definition: None,
            cancel_flag: None,
        }
    }

    pub fn add_injector(&mut self, injector: Box<dyn ParamInjector>) {
        self.injectors.push(injector);
    }

    pub fn set_cache(&mut self, cache: Box<dyn NodeCache>) {
        self.cache = cache;
    }

    pub fn set_max_concurrency(&mut self, n: usize) {
        self.max_concurrency = n.max(1);
    }

    pub fn set_max_retries(&mut self, n: u32) {
        self.max_retries = n;
    }

    /// Wires an external cancellation signal in: once `flag` reads `true`,
    /// the next admission pass records `JobCancelled` and `run_job` returns
    /// `OrchestratorError::JobCancelled`.
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel_flag = Some(flag);
    }

    pub fn get_artifact(&self, hash: &str) -> Option<&Artifact> {
        self.artifact_store.get(hash)
    }

    pub fn store_artifact(&mut self, artifact: Artifact) {
        self.artifact_store.insert(artifact.hash.clone(), artifact);
    }

    pub fn ensure_default_job_id(&mut self) -> Uuid {
        if self.default_job_id.is_none() {
            self.default_job_id = Some(Uuid::new_v4());
        }
        self.default_job_id.unwrap()
    }

    pub fn set_default_job_id(&mut self, job_id: Uuid) {
        self.default_job_id = Some(job_id);
    }

    pub fn default_job_id(&self) -> Option<Uuid> {
        self.default_job_id
    }

    pub fn set_default_definition(&mut self, definition: DagDefinition) {
        self.default_definition = Some(definition);
    }

    pub fn events(&self) -> Option<Vec<ExecEvent>> {
        self.default_job_id.map(|id| self.event_store.list(id))
    }

    pub fn events_for(&self, job_id: Uuid) -> Vec<ExecEvent> {
        self.event_store.list(job_id)
    }

    pub fn default_definition(&self) -> Option<&DagDefinition> {
        self.default_definition.as_ref()
    }

    /// Runs the default job (set via the builder) to completion.
    pub async fn run(&mut self) -> Result<Uuid, OrchestratorError> {
        let job_id = self.ensure_default_job_id();
        let definition = self
            .default_definition
            .take()
            .ok_or_else(|| OrchestratorError::Internal("no default definition configured".into()))?;

        let result = self.run_job(job_id, &definition).await;
        self.default_definition = Some(definition);
        result
    }

    /// Ensures `JobInitialized` exists and returns the job's current events.
    fn load_or_init(&mut self, job_id: Uuid, definition: &DagDefinition) -> Vec<ExecEvent> {
        let mut events = self.event_store.list(job_id);
        let has_init = events.iter().any(|e| matches!(e.kind, ExecEventKind::JobInitialized { .. }));
        if !has_init {
            let ev = self.event_store.append_kind(
                job_id,
                ExecEventKind::JobInitialized { definition_hash: definition.definition_hash.clone(), node_count: definition.len() },
            );
            events.push(ev);
        }
        self.default_job_id = Some(job_id);
        events
    }

    fn hash_and_store_outputs(&mut self, outputs: &mut [Artifact]) -> Vec<String> {
        let mut hashes = Vec::with_capacity(outputs.len());
        for o in outputs.iter_mut() {
            let h = hash_value(&o.payload);
            o.hash = h.clone();
            self.store_artifact(o.clone());
            hashes.push(h);
        }
        hashes
    }

    /// Builds the context a node runs with: its dependency outputs plus
    /// params after injectors have been applied.
    fn build_context(&self, node: &dyn StepDefinition, instance: &DagInstance) -> ExecutionContext {
        let mut inputs = BTreeMap::new();
        for dep in node.dependencies() {
            if let Some(slot) = instance.slot(&dep) {
                if let Some(hash) = slot.outputs.first() {
                    if let Some(artifact) = self.artifact_store.get(hash) {
                        inputs.insert(dep, artifact.clone());
                    }
                }
            }
        }
        let base = node.base_params();
        let probe = ExecutionContext { inputs: inputs.clone(), params: base.clone() };
        let params = CompositeInjector::apply_injectors(&self.injectors, &base, &probe);
        ExecutionContext { inputs, params }
    }

    fn node_fingerprint(&self, node: &dyn StepDefinition, ctx: &ExecutionContext, definition: &DagDefinition) -> String {
        let mut input_hashes: Vec<String> = node
            .dependencies()
            .into_iter()
            .filter_map(|dep| ctx.inputs.get(&dep).map(|a| a.hash.clone()))
            .collect();
        input_hashes.sort_unstable();
        let fp_input = NodeFingerprintInput {
            engine_version: ENGINE_VERSION,
            node_id: node.id(),
            input_hashes: &input_hashes,
            params: &ctx.params,
            definition_hash: &definition.definition_hash,
        };
        hash_value(&serde_json::to_value(&fp_input).expect("serialize fingerprint input"))
    }

    /// Runs `job_id` against `definition` to completion, resuming from
    /// whatever events already exist for it.
    pub async fn run_job(&mut self, job_id: Uuid, definition: &DagDefinition) -> Result<Uuid, OrchestratorError> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut in_flight: JoinSet<(String, StepRunResult)> = JoinSet::new();
        let mut admitted: std::collections::HashSet<String> = std::collections::HashSet::new();

        loop {
            let events = self.load_or_init(job_id, definition);
            let instance = self.repository.load(job_id, &events, definition);

            if instance.cancelled {
                return Err(OrchestratorError::JobCancelled);
            }
            if instance.completed {
                return Ok(job_id);
            }
            if self.cancel_flag.as_ref().is_some_and(|f| f.load(Ordering::SeqCst)) {
                self.event_store.append_kind(job_id, ExecEventKind::JobCancelled);
                continue;
            }

            for (node_id, upstream) in instance.blocked_nodes(definition) {
                if admitted.contains(node_id) {
                    continue;
                }
                self.event_store
                    .append_kind(job_id, ExecEventKind::NodeSkipped { node_id: node_id.to_string(), upstream: upstream.to_string() });
                admitted.insert(node_id.to_string());
            }
            // Re-check after recording skips: they may unblock nothing further
            // this pass, but the next replay will see them as terminal.
            let events = self.event_store.list(job_id);
            let instance = self.repository.load(job_id, &events, definition);

            let mut to_admit: Vec<String> = instance.ready_nodes(definition).into_iter().map(|s| s.to_string()).collect();
            for stale in instance.stale_running(definition) {
                if !admitted.contains(stale) && !to_admit.contains(&stale.to_string()) {
                    to_admit.push(stale.to_string());
                }
            }
            to_admit.sort_unstable();

            if in_flight.is_empty() && to_admit.is_empty() {
                // Nothing ready, nothing running: every remaining node is
                // blocked or the DAG is done but no completion event fired
                // yet (all terminal, non-failed nodes with no new skips).
                let all_terminal = instance.nodes.iter().all(|n| {
                    matches!(
                        n.status,
                        crate::step::NodeStatus::Succeeded
                            | crate::step::NodeStatus::Cached
                            | crate::step::NodeStatus::Failed
                            | crate::step::NodeStatus::Skipped
                    )
                });
                if all_terminal {
                    self.complete_job(job_id, definition).await;
                    continue;
                }
                return Err(OrchestratorError::Internal("DAG stalled: no ready nodes and none in flight".into()));
            }

            for node_id in to_admit {
                if admitted.contains(&node_id) {
                    continue;
                }
                let Some(node_arc) = definition.node_arc(&node_id) else { continue };
                let ctx = self.build_context(node_arc.as_ref(), &instance);
                let fingerprint = self.node_fingerprint(node_arc.as_ref(), &ctx, definition);

                if let Some(cached_outputs) = self.cache.get(&fingerprint) {
                    self.event_store.append_kind(
                        job_id,
                        ExecEventKind::CacheHit { node_id: node_id.clone(), fingerprint: fingerprint.clone() },
                    );
                    let hashes: Vec<String> = cached_outputs.iter().map(|a| a.hash.clone()).collect();
                    for o in &cached_outputs {
                        self.store_artifact(o.clone());
                    }
                    self.event_store.append_kind(
                        job_id,
                        ExecEventKind::NodeCached { node_id: node_id.clone(), outputs: hashes, fingerprint },
                    );
                    admitted.insert(node_id);
                    continue;
                }
                self.event_store.append_kind(
                    job_id,
                    ExecEventKind::CacheMiss { node_id: node_id.clone(), fingerprint: fingerprint.clone() },
                );

                self.event_store.append_kind(job_id, ExecEventKind::NodeStarted { node_id: node_id.clone() });
                admitted.insert(node_id.clone());

                let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
                let node_for_task = node_arc.clone();
                let node_id_for_task = node_id.clone();
                let deadline = node_for_task.timeout();
                in_flight.spawn(async move {
                    let _permit = permit;
                    let result = match tokio::time::timeout(deadline, node_for_task.run(&ctx)).await {
                        Ok(result) => result,
                        Err(_elapsed) => StepRunResult::Failure {
                            error: OrchestratorError::Internal(format!(
                                "node '{node_id_for_task}' exceeded its {}s timeout",
                                deadline.as_secs()
                            )),
                        },
                    };
                    (node_id_for_task, result)
                });
            }

            let Some(join_res) = in_flight.join_next().await else {
                // Nothing was in flight and nothing admitted this pass
                // (everything was a cache hit or a skip); loop again.
                continue;
            };
            let (node_id, run_result) = join_res.map_err(|e| OrchestratorError::Internal(format!("node task panicked: {e}")))?;

            match run_result {
                StepRunResult::Success { mut outputs } => {
                    let hashes = self.hash_and_store_outputs(&mut outputs);
                    let node = definition.node(&node_id).expect("admitted node exists in definition");
                    let events_now = self.event_store.list(job_id);
                    let instance_now = self.repository.load(job_id, &events_now, definition);
                    let ctx = self.build_context(node, &instance_now);
                    let fingerprint = self.node_fingerprint(node, &ctx, definition);
                    self.cache.put(&fingerprint, outputs);
                    self.event_store.append_kind(
                        job_id,
                        ExecEventKind::NodeFinished { node_id: node_id.clone(), outputs: hashes, fingerprint },
                    );
                }
                StepRunResult::Failure { error } => {
                    let retried = self.handle_failure(job_id, definition, &node_id, error).await?;
                    if retried {
                        // The node goes back to `Pending` on replay; forget
                        // our local admission record so it is picked up
                        // again on a future pass.
                        admitted.remove(&node_id);
                    }
                }
            }
        }
    }

    /// Records the failure and, if the node is retryable and under its
    /// retry budget, schedules a retry. Returns whether a retry was
    /// scheduled.
    async fn handle_failure(
        &mut self,
        job_id: Uuid,
        definition: &DagDefinition,
        node_id: &str,
        error: OrchestratorError,
    ) -> Result<bool, OrchestratorError> {
        let node = definition.node(node_id).expect("failing node exists in definition");
        let events = self.event_store.list(job_id);
        let instance = self.repository.load(job_id, &events, definition);
        let slot = instance.slot(node_id).expect("every definition node has a slot");

        let fp_json = json!({
            "engine_version": ENGINE_VERSION,
            "definition_hash": definition.definition_hash,
            "node_id": node_id,
            "attempt": slot.attempts,
        });
        let fingerprint = hash_value(&fp_json);

        self.event_store.append_kind(
            job_id,
            ExecEventKind::NodeFailed { node_id: node_id.to_string(), error: error.clone(), fingerprint },
        );

        let will_retry = node.retryable() && slot.retry_count < self.max_retries;
        if will_retry {
            self.event_store.append_kind(
                job_id,
                ExecEventKind::RetryScheduled {
                    node_id: node_id.to_string(),
                    retry_index: slot.retry_count + 1,
                    reason: Some(error.to_string()),
                },
            );
        }
        Ok(will_retry)
    }

    async fn complete_job(&mut self, job_id: Uuid, definition: &DagDefinition) {
        let events = self.event_store.list(job_id);
        let mut node_fps: Vec<(String, String)> = events
            .iter()
            .filter_map(|e| match &e.kind {
                ExecEventKind::NodeFinished { node_id, fingerprint, .. } => Some((node_id.clone(), fingerprint.clone())),
                ExecEventKind::NodeCached { node_id, fingerprint, .. } => Some((node_id.clone(), fingerprint.clone())),
                _ => None,
            })
            .collect();
        node_fps.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        let fps: Vec<String> = node_fps.into_iter().map(|(_, fp)| fp).collect();

        let job_fingerprint =
            hash_value(&json!({ "engine_version": ENGINE_VERSION, "definition_hash": definition.definition_hash, "node_fingerprints": fps }));

        self.event_store.append_kind(job_id, ExecEventKind::JobCompleted { job_fingerprint });
    }
}

impl Default for DagEngine<crate::event::InMemoryEventStore, crate::repo::InMemoryDagRepository> {
    fn default() -> Self {
        Self::new_with_stores(crate::event::InMemoryEventStore::default(), crate::repo::InMemoryDagRepository::new())
    }
}
