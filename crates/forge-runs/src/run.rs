//! `Run` / `RunManager`: filesystem run-folder lifecycle (spec.md §4.5,
//! §6). A run folder looks like:
//!
//! ```text
//! runs/<job_id>/
//!   manifest.json   atomically rewritten Job snapshot
//!   events.jsonl    append-only Event Log
//!   inputs/
//!   outputs/
//!   logs/
//!   artifacts/
//!   .cache/
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use forge_models::{Job, JobSpec, ManifestView};

use crate::cache::FsNodeCache;
use crate::error::PersistenceError;
use crate::event_log::JsonlEventLog;
use crate::fsutil::atomic_write;

const LAYOUT_DIRS: [&str; 5] = ["inputs", "outputs", "logs", "artifacts", ".cache"];

pub struct RunManager {
    root: PathBuf,
    cache_root: Option<PathBuf>,
}

impl RunManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache_root: None }
    }

    /// Routes every run's cache to `<cache_root>/<job_id>` instead of the
    /// run folder's own `.cache/` subtree (spec.md §6 `CACHE_DIR`).
    pub fn with_cache_root(root: impl Into<PathBuf>, cache_root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache_root: Some(cache_root.into()) }
    }

    pub fn create(&self, job_id: &str, spec: JobSpec) -> Result<Run, PersistenceError> {
        let dir = self.root.join(job_id);
        if dir.join("manifest.json").exists() {
            return Err(PersistenceError::Validation(format!("run '{job_id}' already exists")));
        }
        Self::make_layout(&dir)?;
        let job = Job::new(job_id, spec);
        let run = Run::open(dir, self.cache_dir_for(job_id))?;
        run.write_manifest(&job)?;
        Ok(run)
    }

    pub fn load(&self, job_id: &str) -> Result<Run, PersistenceError> {
        let dir = self.root.join(job_id);
        if !dir.join("manifest.json").exists() {
            return Err(PersistenceError::NotFound(job_id.to_string()));
        }
        Run::open(dir, self.cache_dir_for(job_id))
    }

    fn cache_dir_for(&self, job_id: &str) -> Option<PathBuf> {
        self.cache_root.as_ref().map(|root| root.join(job_id))
    }

    /// Resumes an existing run when `spec.resume` is set and one exists,
    /// otherwise creates a fresh one (spec.md §3 `JobSpec.resume`).
    pub fn create_or_resume(&self, job_id: &str, spec: JobSpec) -> Result<Run, PersistenceError> {
        let dir = self.root.join(job_id);
        if spec.resume && dir.join("manifest.json").exists() {
            return self.load(job_id);
        }
        self.create(job_id, spec)
    }

    pub fn list_job_ids(&self) -> Result<Vec<String>, PersistenceError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().join("manifest.json").is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn make_layout(dir: &Path) -> std::io::Result<()> {
        for sub in LAYOUT_DIRS {
            std::fs::create_dir_all(dir.join(sub))?;
        }
        Ok(())
    }
}

pub struct Run {
    dir: PathBuf,
    cache_dir_override: Option<PathBuf>,
    /// `Arc`-wrapped so callers can also hand it out as a
    /// `forge_models::EventSink` (the Artifact Store and step
    /// implementations append through that trait rather than depending on
    /// `forge-runs` directly).
    pub event_log: Arc<JsonlEventLog>,
}

impl Run {
    fn open(dir: PathBuf, cache_dir_override: Option<PathBuf>) -> Result<Self, PersistenceError> {
        let event_log = Arc::new(JsonlEventLog::open(dir.join("events.jsonl"))?);
        Ok(Self { dir, cache_dir_override, event_log })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.dir.join("inputs")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.dir.join("outputs")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.join("logs")
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.dir.join("artifacts")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir_override.clone().unwrap_or_else(|| self.dir.join(".cache"))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join("manifest.json")
    }

    /// Reads `manifest.json` (spec.md §6 shape) and reconstructs a working
    /// `Job` from it. See `Job::from_manifest_view` for what is and isn't
    /// preserved across the round trip.
    pub fn read_manifest(&self) -> Result<Job, PersistenceError> {
        let bytes = std::fs::read(self.manifest_path())?;
        let view: ManifestView = serde_json::from_slice(&bytes)?;
        Ok(Job::from_manifest_view(view))
    }

    /// Atomically rewrites `manifest.json` with `job`'s current state,
    /// projected onto the spec.md §6 shape.
    pub fn write_manifest(&self, job: &Job) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(&job.to_manifest_view())?;
        atomic_write(&self.manifest_path(), &bytes)?;
        Ok(())
    }

    /// Writes the final manifest. Only callable once the job has reached a
    /// terminal status (spec.md §3 invariant: a sealed run's manifest never
    /// changes again).
    pub fn seal(&self, job: &mut Job) -> Result<(), PersistenceError> {
        if !job.status.is_terminal() {
            return Err(PersistenceError::Validation("cannot seal a non-terminal job".to_string()));
        }
        if job.completed_at.is_none() {
            job.completed_at = Some(chrono::Utc::now());
        }
        self.write_manifest(job)
    }

    pub fn cache(&self) -> Result<FsNodeCache, PersistenceError> {
        Ok(FsNodeCache::new(self.cache_dir())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_models::JobStatus;

    fn spec() -> JobSpec {
        JobSpec::new("notes-app", "scaffold a notes app", "ollama").unwrap()
    }

    #[test]
    fn create_lays_out_the_run_folder() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        let run = manager.create("job-1", spec()).unwrap();
        for sub in LAYOUT_DIRS {
            assert!(run.dir().join(sub).is_dir(), "missing {sub}");
        }
        assert!(run.manifest_path().is_file());
        let job = run.read_manifest().unwrap();
        assert_eq!(job.job_id, "job-1");
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn create_twice_fails() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        manager.create("job-1", spec()).unwrap();
        let err = manager.create("job-1", spec()).unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
    }

    #[test]
    fn load_finds_an_existing_run() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        manager.create("job-1", spec()).unwrap();
        let run = manager.load("job-1").unwrap();
        assert_eq!(run.read_manifest().unwrap().job_id, "job-1");
    }

    #[test]
    fn load_missing_run_errors() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        let err = manager.load("nope").unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(_)));
    }

    #[test]
    fn create_or_resume_reuses_existing_run_when_requested() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        manager.create("job-1", spec()).unwrap();
        let resumed = manager.create_or_resume("job-1", spec().with_resume(true)).unwrap();
        assert_eq!(resumed.read_manifest().unwrap().job_id, "job-1");
    }

    #[test]
    fn seal_rejects_non_terminal_job() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        let run = manager.create("job-1", spec()).unwrap();
        let mut job = run.read_manifest().unwrap();
        let err = run.seal(&mut job).unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
    }

    #[test]
    fn seal_succeeds_and_stamps_completed_at() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        let run = manager.create("job-1", spec()).unwrap();
        let mut job = run.read_manifest().unwrap();
        job.status = JobStatus::Succeeded;
        run.seal(&mut job).unwrap();
        assert!(job.completed_at.is_some());
        let reloaded = run.read_manifest().unwrap();
        assert_eq!(reloaded.status, JobStatus::Succeeded);
    }

    #[test]
    fn list_job_ids_only_counts_sealed_layouts() {
        let root = tempfile::tempdir().unwrap();
        let manager = RunManager::new(root.path());
        manager.create("job-a", spec()).unwrap();
        manager.create("job-b", spec()).unwrap();
        std::fs::create_dir_all(root.path().join("job-c-incomplete")).unwrap();
        let ids = manager.list_job_ids().unwrap();
        assert_eq!(ids, vec!["job-a".to_string(), "job-b".to_string()]);
    }
}
