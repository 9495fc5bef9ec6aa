//! forge-orchestrator: composes `forge-core`'s DAG Executor, `forge-runs`'s
//! Run Manager, and `forge-adapters`'s four canonical steps into the
//! code-generation job spec.md §4.7 defines. The teacher's `chem-infra`
//! crate was an empty stub (a `Cargo.toml` with no source) depending on
//! `chem-core` + `chem-persistence`; this is that stub built out.
//!
//! `run_job` is the single entry point: materialize or resume a run
//! folder, drive `architect -> {builder, docs} -> qa` to completion,
//! mirror the engine's internal event stream into the run's durable
//! `events.jsonl`, and seal the manifest.

mod manifest;
pub mod provider;
pub mod wiring;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use uuid::Uuid;

use forge_adapters::ArtifactStore;
use forge_core::OrchestratorError as EngineError;
use forge_models::{Event, EventSink, Job, JobSpec, JobStatus};
use forge_providers::ProviderTransport;
use forge_runs::{PersistenceError, RunManager};

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorRunError {
    #[error("run persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Namespace for deriving a stable per-process `Uuid` from a run's string
/// `job_id` (the DAG Executor keys its internal event-sourced state by
/// `Uuid`; the Run Manager's folder names are free-form strings).
const JOB_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x8f, 0x3a, 0x3c, 0x0c, 0x1d, 0x4e, 0x4b, 0x8f, 0x9b, 0x52, 0x3a, 0x0a, 0x3e, 0x6a, 0x06, 0x2c,
]);

/// Runs `job_id` to completion against `spec`, creating or resuming its run
/// folder under `run_manager`'s root. `model`/`transport` select the
/// concrete Provider Adapter backend; `architect`, `builder`, and `docs`
/// share one adapter instance, `qa` never calls it.
///
/// The DAG Executor's own event-sourced replay is scoped to this call: a
/// crash mid-run does not resume node-by-node, it restarts the graph and
/// relies on the per-run filesystem Cache to skip nodes whose fingerprint
/// is unchanged (spec.md §1 non-goal: no durable multi-tenant store). What
/// *is* durable across restarts is the job-facing contract — `events.jsonl`
/// and `manifest.json` — and the artifacts already written to `outputs/`.
pub async fn run_job(
    run_manager: &RunManager,
    job_id: &str,
    spec: JobSpec,
    model: &str,
    transport: Arc<dyn ProviderTransport>,
) -> Result<Job, OrchestratorRunError> {
    run_job_cancellable(run_manager, job_id, spec, model, transport, None).await
}

/// As `run_job`, but wires `cancel_flag` into the DAG Executor: a caller
/// (e.g. a Ctrl-C handler) sets it to request cancellation (spec.md §4.6).
pub async fn run_job_cancellable(
    run_manager: &RunManager,
    job_id: &str,
    spec: JobSpec,
    model: &str,
    transport: Arc<dyn ProviderTransport>,
    cancel_flag: Option<Arc<AtomicBool>>,
) -> Result<Job, OrchestratorRunError> {
    let run = run_manager.create_or_resume(job_id, spec.clone())?;
    let mut job = run.read_manifest()?;
    manifest::ensure_steps(&mut job);
    job.status = JobStatus::Running;
    run.write_manifest(&job)?;
    run.event_log.emit(&Event::new(job_id, "job.started"))?;

    let provider = provider::build_provider(&spec.provider, model, transport)?;
    let event_sink: Arc<dyn EventSink> = run.event_log.clone();
    let artifacts = Arc::new(ArtifactStore::new(run.dir()).with_event_sink(job_id, event_sink));
    let mut engine = wiring::build_engine(&spec, Arc::new(provider), artifacts.clone())?;
    engine.set_cache(Box::new(run.cache()?));
    if let Some(flag) = cancel_flag {
        engine.set_cancel_flag(flag);
    }

    let job_uuid = Uuid::new_v5(&JOB_ID_NAMESPACE, job_id.as_bytes());
    engine.set_default_job_id(job_uuid);
    let run_result = engine.run().await;

    let exec_events = engine.events_for(job_uuid);
    manifest::mirror_events(&run, job_id, &exec_events)?;
    let job_events = run.event_log.read_all()?;
    manifest::apply_step_results(&mut job, &exec_events, &artifacts, &job_events);

    match &run_result {
        Ok(_) => {
            job.finish();
            if !job.status.is_terminal() {
                // No steps ever ran (an empty or fully-skipped graph);
                // the DAG still reported completion.
                job.status = JobStatus::Succeeded;
                job.completed_at = Some(chrono::Utc::now());
            }
        }
        Err(EngineError::JobCancelled) => job.status = JobStatus::Cancelled,
        Err(_) => {
            job.finish();
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.completed_at = Some(chrono::Utc::now());
            }
        }
    }

    run.seal(&mut job)?;
    let completion_type = match job.status {
        JobStatus::Succeeded => "job.succeeded",
        JobStatus::Failed => "job.failed",
        JobStatus::Cancelled => "job.cancelled",
        JobStatus::Pending | JobStatus::Running => "job.completed",
    };
    run.event_log.emit(&Event::new(job_id, completion_type))?;

    // A job that failed or was cancelled is not a `run_job` error: its
    // manifest is sealed with the terminal status and returned to the
    // caller, who maps `job.status` to an exit code (spec.md §6). Only
    // infrastructure failures (persistence, engine setup) surface here.
    Ok(job)
}
