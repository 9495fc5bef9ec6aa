//! Translates the DAG Executor's internal `ExecEvent` stream into the
//! job-facing records spec.md §6 defines: `events.jsonl` lines and the
//! per-step entries of `manifest.json`.
//!
//! The canonical graph's four node ids double as the only step names a
//! job ever has, so the file-to-step attribution below (`design.md` ->
//! `architect`, `README.md` -> `docs`, `qa_report.md` -> `qa`, everything
//! else -> `builder`) is safe precisely because this crate is the one that
//! wired the graph in the first place.

use std::path::Path;

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};

use forge_adapters::ArtifactStore;
use forge_core::{ExecEvent, ExecEventKind};
use forge_models::{Artifact, Event, EventLevel, Failure, Job, StepResult, StepStatus};
use forge_runs::Run;

use crate::OrchestratorRunError;

pub const NODE_IDS: [&str; 4] = ["architect", "builder", "docs", "qa"];

pub fn ensure_steps(job: &mut Job) {
    if job.steps.is_empty() {
        job.steps = NODE_IDS.iter().map(|id| StepResult::pending(*id)).collect();
    }
}

/// Appends one `events.jsonl` record per `ExecEvent`, using the dotted
/// identifiers spec.md §6/§8 names (`step.started`, `step.succeeded`, ...).
pub fn mirror_events(run: &Run, job_id: &str, events: &[ExecEvent]) -> Result<(), OrchestratorRunError> {
    for ev in events {
        let Some((event_type, step, level, data)) = describe(&ev.kind) else { continue };
        let mut record = Event::new(job_id, event_type).with_level(level).with_data(data);
        record.ts = ev.ts;
        if let Some(step) = step {
            record = record.with_step(step);
        }
        run.event_log.emit(&record)?;
    }
    Ok(())
}

fn describe(kind: &ExecEventKind) -> Option<(&'static str, Option<String>, EventLevel, serde_json::Value)> {
    match kind {
        ExecEventKind::JobInitialized { definition_hash, node_count } => {
            Some(("job.started", None, EventLevel::Info, json!({"definition_hash": definition_hash, "node_count": node_count})))
        }
        ExecEventKind::NodeStarted { node_id } => Some(("step.started", Some(node_id.clone()), EventLevel::Info, json!({}))),
        ExecEventKind::NodeFinished { node_id, outputs, fingerprint } => {
            Some(("step.succeeded", Some(node_id.clone()), EventLevel::Info, json!({"outputs": outputs, "fingerprint": fingerprint})))
        }
        ExecEventKind::NodeCached { node_id, outputs, fingerprint } => {
            Some(("step.cached", Some(node_id.clone()), EventLevel::Info, json!({"outputs": outputs, "fingerprint": fingerprint})))
        }
        ExecEventKind::CacheHit { node_id, fingerprint } => {
            Some(("cache.hit", Some(node_id.clone()), EventLevel::Info, json!({"fingerprint": fingerprint})))
        }
        ExecEventKind::CacheMiss { node_id, fingerprint } => {
            Some(("cache.miss", Some(node_id.clone()), EventLevel::Info, json!({"fingerprint": fingerprint})))
        }
        ExecEventKind::NodeFailed { node_id, error, fingerprint } => Some((
            "step.failed",
            Some(node_id.clone()),
            EventLevel::Error,
            json!({"kind": error.failure_kind(), "message": error.to_string(), "fingerprint": fingerprint}),
        )),
        ExecEventKind::NodeSkipped { node_id, upstream } => {
            Some(("step.skipped", Some(node_id.clone()), EventLevel::Warn, json!({"upstream": upstream})))
        }
        ExecEventKind::RetryScheduled { node_id, retry_index, reason } => Some((
            "step.retry_scheduled",
            Some(node_id.clone()),
            EventLevel::Warn,
            json!({"retry_index": retry_index, "reason": reason}),
        )),
        ExecEventKind::JobCompleted { job_fingerprint } => Some(("job.completed", None, EventLevel::Info, json!({"job_fingerprint": job_fingerprint}))),
        ExecEventKind::JobCancelled => Some(("job.cancelled", None, EventLevel::Warn, json!({}))),
    }
}

/// Folds the `ExecEvent` stream into `job.steps`, matching each terminal
/// kind to the `StepResult` state machine transition it represents.
///
/// `job_events` is the already-mirrored job-facing `events.jsonl` stream
/// (see `mirror_events`): a provider retry that succeeds within a single
/// step invocation never produces a `RetryScheduled` `ExecEvent` (spec.md
/// §8 scenario 3), so `retry_count` is also derived by counting that
/// step's `llm.request` events, and the two sources are combined with
/// `max` since only one of them is usually nonzero for a given step.
pub fn apply_step_results(job: &mut Job, events: &[ExecEvent], artifacts: &ArtifactStore, job_events: &[Event]) {
    ensure_steps(job);
    for ev in events {
        match &ev.kind {
            ExecEventKind::NodeStarted { node_id } => {
                if let Some(step) = job.step_mut(node_id) {
                    if step.status == StepStatus::Pending {
                        let _ = step.transition(StepStatus::Running);
                        step.started_at = Some(ev.ts);
                    }
                }
            }
            ExecEventKind::NodeFinished { node_id, .. } => {
                let retry_count = provider_retry_count(job_events, node_id);
                if let Some(step) = job.step_mut(node_id) {
                    let _ = step.transition(StepStatus::Succeeded);
                    finish_step(step, ev.ts, artifacts);
                    step.retry_count = step.retry_count.max(retry_count);
                }
            }
            ExecEventKind::NodeCached { node_id, .. } => {
                if let Some(step) = job.step_mut(node_id) {
                    let _ = step.transition(StepStatus::Cached);
                    finish_step(step, ev.ts, artifacts);
                }
            }
            ExecEventKind::NodeFailed { node_id, error, .. } => {
                if let Some(step) = job.step_mut(node_id) {
                    let _ = step.transition(StepStatus::Failed);
                    step.completed_at = Some(ev.ts);
                    step.failure = Some(Failure::new(error.failure_kind(), error.to_string()));
                }
            }
            ExecEventKind::NodeSkipped { node_id, upstream } => {
                if let Some(step) = job.step_mut(node_id) {
                    let _ = step.transition(StepStatus::Skipped);
                    step.completed_at = Some(ev.ts);
                    step.failure = Some(Failure::dependency_failed(upstream.clone()));
                }
            }
            // A retry moves a terminally-Failed step back to Pending, the
            // one sanctioned exception to StepStatus's monotonic invariant
            // (mirrors forge-core's own DagRepository replay of the same
            // event).
            ExecEventKind::RetryScheduled { node_id, retry_index, .. } => {
                if let Some(step) = job.step_mut(node_id) {
                    step.retry_count = *retry_index;
                    step.status = StepStatus::Pending;
                    step.failure = None;
                    step.started_at = None;
                    step.completed_at = None;
                }
            }
            ExecEventKind::JobInitialized { .. }
            | ExecEventKind::JobCompleted { .. }
            | ExecEventKind::JobCancelled
            | ExecEventKind::CacheHit { .. }
            | ExecEventKind::CacheMiss { .. } => {}
        }
    }
    job.artifacts = job.steps.iter().flat_map(|s| s.artifacts.clone()).collect();
    job.artifacts.sort_by(|a, b| a.path.cmp(&b.path));
}

/// Attempts beyond the first for `node_id`, counted from `llm.request`
/// events rather than `RetryScheduled` (see `apply_step_results`).
fn provider_retry_count(job_events: &[Event], node_id: &str) -> u32 {
    let requests = job_events
        .iter()
        .filter(|e| e.event_type == "llm.request" && e.step.as_deref() == Some(node_id))
        .count() as u32;
    requests.saturating_sub(1)
}

fn finish_step(step: &mut StepResult, ts: chrono::DateTime<Utc>, artifacts: &ArtifactStore) {
    step.completed_at = Some(ts);
    if let Some(started) = step.started_at {
        step.duration_s = Some((ts - started).num_milliseconds().max(0) as f64 / 1000.0);
    }
    step.artifacts = collect_step_artifacts(artifacts, &step.step_name);
}

fn collect_step_artifacts(store: &ArtifactStore, node_id: &str) -> Vec<Artifact> {
    let outputs = store.root().join("outputs");
    let mut out = Vec::new();
    walk(&outputs, &outputs, &mut out, node_id);
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<Artifact>, node_id: &str) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, out, node_id);
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else { continue };
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        if owner_of(&rel_str) != node_id {
            continue;
        }
        let Ok(bytes) = std::fs::read(&path) else { continue };
        let sha256 = hex::encode(Sha256::digest(&bytes));
        out.push(Artifact::new(rel_str.clone(), sha256, bytes.len() as u64, media_type_for(&rel_str), node_id));
    }
}

fn owner_of(relative_path: &str) -> &'static str {
    match relative_path {
        "design.md" => "architect",
        "README.md" => "docs",
        "qa_report.md" => "qa",
        _ => "builder",
    }
}

fn media_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("md") => "text/markdown",
        Some("py") => "text/x-python",
        Some("rs") => "text/rust",
        Some("json") => "application/json",
        Some("toml") => "application/toml",
        _ => "text/plain",
    }
}
