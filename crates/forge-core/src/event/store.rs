//! Append-only event storage (event sourcing) for jobs.
//!
//! Each job (identified by a UUID) accumulates an ordered sequence of
//! `ExecEvent`s. The store only ever appends; nothing is mutated or
//! deleted, which is what lets `DagRepository` reconstruct state by replay.

use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use super::{ExecEvent, ExecEventKind};

/// Append-only event storage for jobs.
///
/// - `append_kind` appends a deterministic event to `job_id`'s log and
///   assigns `seq` and `ts`.
/// - `list` returns all events for `job_id` in ascending `seq` order.
pub trait EventStore {
    fn append_kind(&mut self, job_id: Uuid, kind: ExecEventKind) -> ExecEvent;

    fn list(&self, job_id: Uuid) -> Vec<ExecEvent>;
}

/// In-memory `EventStore`.
///
/// Volatile and not thread-synchronized; callers needing concurrency wrap
/// it in a `Mutex`/`RwLock`. Useful for tests and in-process engine runs —
/// `forge-runs::JsonlEventLog` is the durable, file-backed counterpart.
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<ExecEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self { inner: HashMap::new() }
    }

    pub fn len_for(&self, job_id: Uuid) -> usize {
        self.inner.get(&job_id).map(|v| v.len()).unwrap_or(0)
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&mut self, job_id: Uuid, kind: ExecEventKind) -> ExecEvent {
        let vec = self.inner.entry(job_id).or_default();
        let seq = vec.len() as u64;
        let ev = ExecEvent { seq, job_id, kind, ts: Utc::now() };
        vec.push(ev.clone());
        ev
    }

    fn list(&self, job_id: Uuid) -> Vec<ExecEvent> {
        self.inner.get(&job_id).cloned().unwrap_or_default()
    }
}
