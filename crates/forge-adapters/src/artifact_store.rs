//! Filesystem Artifact Store: persists node outputs under a run's
//! `outputs/`/`artifacts/` subtree (spec.md §4.1).
//!
//! Grounded in the teacher's checkpoint durability discipline
//! (write-temp, fsync, rename) and enriched from
//! `groblegark-oddjobs/crates/storage/src/checkpoint.rs`'s
//! write-temp + fsync + rename sequence, simplified here since a single
//! artifact write doesn't need that module's background-thread/trait
//! injection machinery built for WAL snapshotting. The per-path exclusive
//! lock is realized with `dashmap` (already a teacher dependency) so two
//! concurrent writers never interleave on the same relative path.

use std::fs::{self, File};
use std::io::Write as _;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use forge_models::{Artifact, Event, EventSink};

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("unsafe artifact path '{0}': must be relative and stay within the store root")]
    UnsafePath(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a write produced new bytes on disk, and why (spec.md §4.1: a
/// re-run against the same fingerprint must not corrupt or duplicate a
/// prior output; §8 scenario 6 checks these three outcomes by name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl WriteOutcome {
    pub fn wrote(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "nochange",
        }
    }
}

pub struct ArtifactStore {
    root: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    job_id: String,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: DashMap::new(), job_id: String::new(), event_sink: None }
    }

    /// Routes this store's `file.written`/`llm.request`/`llm.response`
    /// events (spec.md §4.1, §4.4) into `sink`, tagged with `job_id`.
    /// Without this, writes still happen but nothing is recorded.
    pub fn with_event_sink(mut self, job_id: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        self.job_id = job_id.into();
        self.event_sink = Some(sink);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` to `relative_path` under the store root, returning the
    /// resulting `Artifact` record and whether it was a new write.
    ///
    /// Side effect: emits `file.written` with the path, hash, `wrote` flag,
    /// and reason (spec.md §4.1).
    pub fn write(
        &self,
        relative_path: &str,
        media_type: &str,
        produced_by: &str,
        bytes: &[u8],
    ) -> Result<(Artifact, WriteOutcome), ArtifactStoreError> {
        let full_path = self.resolve(relative_path)?;

        let path_lock = self.locks.entry(full_path.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        let _guard = path_lock.lock().expect("artifact path lock poisoned");

        let sha256 = hex::encode(Sha256::digest(bytes));
        let outcome = match fs::read(&full_path) {
            Ok(existing) if hex::encode(Sha256::digest(&existing)) == sha256 => WriteOutcome::Unchanged,
            Ok(_) => {
                atomic_write(&full_path, bytes)?;
                WriteOutcome::Updated
            }
            Err(_) => {
                atomic_write(&full_path, bytes)?;
                WriteOutcome::Created
            }
        };

        self.emit_event(
            "file.written",
            Some(produced_by),
            serde_json::json!({"path": relative_path, "hash": sha256, "wrote": outcome.wrote(), "reason": outcome.reason()}),
        );

        let artifact = Artifact::new(relative_path, sha256, bytes.len() as u64, media_type, produced_by);
        Ok((artifact, outcome))
    }

    /// Appends a job-facing event timestamped now. A no-op store (no sink
    /// wired, e.g. most unit tests) silently drops it.
    pub fn emit_event(&self, event_type: &str, step: Option<&str>, data: Value) {
        self.emit_event_at(Utc::now(), event_type, step, data);
    }

    /// As `emit_event`, but with an explicit timestamp — used to record
    /// `llm.request`/`llm.response` pairs at the moments they actually
    /// happened rather than when the enclosing step returns (spec.md §4.4,
    /// §8 scenario 3's backoff-visible-in-timestamps check).
    pub fn emit_event_at(&self, ts: DateTime<Utc>, event_type: &str, step: Option<&str>, data: Value) {
        let Some(sink) = &self.event_sink else { return };
        let mut event = Event::new(&self.job_id, event_type).with_data(data);
        event.ts = ts;
        if let Some(step) = step {
            event = event.with_step(step);
        }
        sink.record(event);
    }

    fn resolve(&self, relative_path: &str) -> Result<PathBuf, ArtifactStoreError> {
        let rel = Path::new(relative_path);
        let safe = rel.is_relative() && !rel.components().any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if !safe {
            return Err(ArtifactStoreError::UnsafePath(relative_path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or("tmp");
    let tmp_path = dir.join(format!(".{file_name}.tmp-{}", std::process::id()));
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_bytes_and_reports_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (artifact, outcome) = store.write("outputs/design.md", "text/markdown", "architect", b"# Design\n").unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(artifact.size_bytes, 9);
        assert_eq!(fs::read(dir.path().join("outputs/design.md")).unwrap(), b"# Design\n");
    }

    #[test]
    fn rewriting_identical_bytes_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let (first, _) = store.write("outputs/design.md", "text/markdown", "architect", b"same").unwrap();
        let (second, outcome) = store.write("outputs/design.md", "text/markdown", "architect", b"same").unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert_eq!(first.sha256, second.sha256);
    }

    #[test]
    fn rewriting_different_bytes_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write("outputs/design.md", "text/markdown", "architect", b"v1").unwrap();
        let (artifact, outcome) = store.write("outputs/design.md", "text/markdown", "architect", b"v2").unwrap();
        assert_eq!(outcome, WriteOutcome::Updated);
        assert_eq!(fs::read(dir.path().join("outputs/design.md")).unwrap(), b"v2");
        assert_ne!(artifact.sha256, hex::encode(Sha256::digest(b"v1")));
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.write("../escape.md", "text/markdown", "architect", b"x").unwrap_err();
        assert!(matches!(err, ArtifactStoreError::UnsafePath(_)));
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<Event>>,
    }

    impl EventSink for RecordingSink {
        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn write_emits_file_written_with_wrote_and_reason() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let store = ArtifactStore::new(dir.path()).with_event_sink("job-1", sink.clone());

        store.write("outputs/main.py", "text/x-python", "builder", b"x").unwrap();
        store.write("outputs/main.py", "text/x-python", "builder", b"x").unwrap();
        store.write("outputs/main.py", "text/x-python", "builder", b"y").unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.event_type == "file.written" && e.job_id == "job-1" && e.step.as_deref() == Some("builder")));
        assert_eq!(events[0].data["reason"], "created");
        assert_eq!(events[0].data["wrote"], true);
        assert_eq!(events[1].data["reason"], "nochange");
        assert_eq!(events[1].data["wrote"], false);
        assert_eq!(events[2].data["reason"], "updated");
        assert_eq!(events[2].data["wrote"], true);
    }

    #[test]
    fn store_without_a_sink_writes_but_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.write("outputs/main.py", "text/x-python", "builder", b"x").unwrap();
        assert!(fs::read(dir.path().join("outputs/main.py")).is_ok());
    }
}
