//! `JobSpecInjector`: merges the job's declarative inputs into every
//! node's params, generalizing the teacher's per-node `ParamInjector`
//! idiom (a `FamilyHashInjector`-shaped injector that reads ambient state
//! rather than the node's own dependency output) from molecule family
//! hashes to job-level task metadata.

use serde_json::json;

use forge_core::model::ExecutionContext;
use forge_core::ParamInjector;
use forge_models::JobSpec;

#[derive(Debug)]
pub struct JobSpecInjector {
    project: String,
    task_description: String,
    provider: String,
}

impl JobSpecInjector {
    pub fn new(spec: &JobSpec) -> Self {
        Self { project: spec.project.clone(), task_description: spec.task_description.clone(), provider: spec.provider.clone() }
    }
}

impl ParamInjector for JobSpecInjector {
    fn inject(&self, _base: &serde_json::Value, _ctx: &ExecutionContext) -> serde_json::Value {
        json!({
            "project": self.project,
            "task_description": self.task_description,
            "provider": self.provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_core::injection::CompositeInjector;
    use std::collections::BTreeMap;

    #[test]
    fn injects_job_fields_over_base_params() {
        let spec = JobSpec::new("notes-app", "scaffold a notes app", "ollama").unwrap();
        let injector: Box<dyn ParamInjector> = Box::new(JobSpecInjector::new(&spec));
        let ctx = ExecutionContext { inputs: BTreeMap::new(), params: json!({"temperature": 0.1}) };
        let merged = CompositeInjector::apply_injectors(&[injector], &json!({"temperature": 0.1}), &ctx);
        assert_eq!(merged["project"], "notes-app");
        assert_eq!(merged["task_description"], "scaffold a notes app");
        assert_eq!(merged["temperature"], 0.1);
    }
}
