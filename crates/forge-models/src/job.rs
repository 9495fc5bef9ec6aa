//! `Job` — the in-memory working state of a running or completed job
//! (spec.md §3, §4.6), and `ManifestView`, the reduced shape actually
//! persisted to `manifest.json` (spec.md §6). The two diverge because a
//! `Job`'s `spec` is re-supplied fresh by the caller on every `run_job`
//! invocation (never read back off disk) and `step.artifacts` is
//! recomputed from the Artifact Store rather than trusted from a prior
//! write, so neither needs to round-trip through the manifest file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{artifact::Artifact, failure::Failure, job_spec::JobSpec, step_result::StepResult, step_result::StepStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub spec: JobSpec,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepResult>,
    pub artifacts: Vec<Artifact>,
}

impl Job {
    pub fn new(job_id: impl Into<String>, spec: JobSpec) -> Self {
        Self {
            job_id: job_id.into(),
            spec,
            status: JobStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            steps: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step_name == name)
    }

    pub fn step_mut(&mut self, name: &str) -> Option<&mut StepResult> {
        self.steps.iter_mut().find(|s| s.step_name == name)
    }

    /// Derives the job's terminal status from its steps: failed if any step
    /// failed, succeeded if all steps reached a success-equivalent state
    /// (spec.md §4.6 completion rule).
    pub fn finish(&mut self) {
        let any_failed = self.steps.iter().any(|s| s.status == crate::step_result::StepStatus::Failed);
        let all_done = self.steps.iter().all(|s| s.status.is_terminal());
        if !all_done {
            return;
        }
        self.status = if any_failed { JobStatus::Failed } else { JobStatus::Succeeded };
        self.completed_at = Some(Utc::now());
    }

    /// Reconstructs working state from a loaded manifest. `step.artifacts`
    /// starts empty — the caller repopulates it from the Artifact Store via
    /// `apply_step_results` — and `spec` is rebuilt from the manifest's own
    /// `project`/`task_description`/`provider` fields only, since the live
    /// `JobSpec` the caller already holds is what actually drives execution.
    pub fn from_manifest_view(view: ManifestView) -> Self {
        let spec = JobSpec::new(view.project, view.task_description, view.provider).unwrap_or_else(|_| {
            JobSpec::new("unknown", "unknown", "unknown").expect("fallback JobSpec is always valid")
        });
        Self {
            job_id: view.job_id,
            spec,
            status: view.status,
            started_at: view.started_at,
            completed_at: view.completed_at,
            steps: view.steps.into_iter().map(ManifestStepView::into_step_result).collect(),
            artifacts: view.files,
        }
    }

    pub fn to_manifest_view(&self) -> ManifestView {
        ManifestView::from(self)
    }
}

/// The shape actually written to `manifest.json` (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestView {
    pub job_id: String,
    pub project: String,
    pub task_description: String,
    pub provider: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    pub steps: Vec<ManifestStepView>,
    pub completed_steps: Vec<String>,
    pub pending_steps: Vec<String>,
    pub files: Vec<Artifact>,
}

/// One `manifest.json` step entry (spec.md §6's `steps` column). Named
/// `name` on disk rather than `step_name`, and carries no artifact list of
/// its own — those live in the manifest's top-level `files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStepView {
    pub name: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_s: Option<f64>,
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
}

impl ManifestStepView {
    fn into_step_result(self) -> StepResult {
        StepResult {
            step_name: self.name,
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            duration_s: self.duration_s,
            artifacts: Vec::new(),
            failure: self.failure,
            output: None,
            retry_count: self.retry_count,
        }
    }
}

impl From<&StepResult> for ManifestStepView {
    fn from(step: &StepResult) -> Self {
        Self {
            name: step.step_name.clone(),
            status: step.status,
            started_at: step.started_at,
            completed_at: step.completed_at,
            duration_s: step.duration_s,
            retry_count: step.retry_count,
            failure: step.failure.clone(),
        }
    }
}

impl From<&Job> for ManifestView {
    fn from(job: &Job) -> Self {
        let duration_s = job.completed_at.map(|end| (end - job.started_at).num_milliseconds().max(0) as f64 / 1000.0);
        let mut completed_steps = Vec::new();
        let mut pending_steps = Vec::new();
        for step in &job.steps {
            if step.status.is_success_equivalent() {
                completed_steps.push(step.step_name.clone());
            } else {
                pending_steps.push(step.step_name.clone());
            }
        }
        Self {
            job_id: job.job_id.clone(),
            project: job.spec.project.clone(),
            task_description: job.spec.task_description.clone(),
            provider: job.spec.provider.clone(),
            status: job.status,
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration_s,
            steps: job.steps.iter().map(ManifestStepView::from).collect(),
            completed_steps,
            pending_steps,
            files: job.artifacts.clone(),
        }
    }
}
