//! `JobSpec` — immutable declarative input to a job (spec.md §3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

fn default_concurrency() -> u32 {
    4
}

/// Declarative input to a job. Inputs reject unknown fields: a spec file
/// with a typo'd key should fail loudly rather than silently ignore it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    pub project: String,
    pub task_description: String,
    pub provider: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default)]
    pub resume: bool,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
}

impl JobSpec {
    /// Constructs a spec, validating the invariants spec.md §3 requires:
    /// non-empty project identifier and a positive concurrency limit.
    pub fn new(
        project: impl Into<String>,
        task_description: impl Into<String>,
        provider: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let spec = Self {
            project: project.into(),
            task_description: task_description.into(),
            provider: provider.into(),
            concurrency: default_concurrency(),
            resume: false,
            inputs: BTreeMap::new(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.project.trim().is_empty() {
            return Err(ModelError::validation("project", "must not be empty"));
        }
        if self.concurrency == 0 {
            return Err(ModelError::validation("concurrency", "must be positive"));
        }
        Ok(())
    }

    pub fn with_concurrency(mut self, concurrency: u32) -> Result<Self, ModelError> {
        self.concurrency = concurrency;
        self.validate()?;
        Ok(self)
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_project() {
        let err = JobSpec::new("  ", "do it", "ollama").unwrap_err();
        assert!(matches!(err, ModelError::Validation { field: "project", .. }));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let spec = JobSpec::new("notes", "do it", "ollama").unwrap();
        let err = spec.with_concurrency(0).unwrap_err();
        assert!(matches!(err, ModelError::Validation { field: "concurrency", .. }));
    }

    #[test]
    fn deserialize_rejects_unknown_fields() {
        let raw = r#"{"project":"notes","task_description":"x","provider":"ollama","bogus":1}"#;
        let result: Result<JobSpec, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn deserialize_applies_defaults() {
        let raw = r#"{"project":"notes","task_description":"x","provider":"ollama"}"#;
        let spec: JobSpec = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.concurrency, 4);
        assert!(!spec.resume);
    }
}
