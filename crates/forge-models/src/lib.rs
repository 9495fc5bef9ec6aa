//! forge-models: typed value objects for the orchestration core.
//!
//! Mirrors the teacher's `chem-domain` role: neutral, serde-friendly data
//! objects with validation at construction and no I/O of their own. None of
//! these types know how to execute, persist, or log themselves — that is
//! the job of `forge-core` / `forge-runs` / `forge-adapters`.

pub mod error;
pub mod job;
pub mod job_spec;
pub mod step_result;
pub mod failure;
pub mod artifact;
pub mod event;

pub use error::ModelError;
pub use job::{Job, JobStatus, ManifestStepView, ManifestView};
pub use job_spec::JobSpec;
pub use step_result::{StepResult, StepStatus};
pub use failure::{Failure, FailureKind};
pub use artifact::Artifact;
pub use event::{Event, EventLevel, EventSink};
