use std::sync::Arc;

use forge_models::{JobSpec, JobStatus, StepStatus};
use forge_orchestrator::run_job;
use forge_providers::{FakeTransport, ProviderTransport, TransportResponse};
use forge_runs::RunManager;
use serde_json::json;

fn text_response(text: &str) -> Result<TransportResponse, forge_providers::TransportError> {
    Ok(TransportResponse { text: text.to_string(), tool_result: None, prompt_tokens: None, completion_tokens: None })
}

fn tool_response(tool_result: serde_json::Value) -> Result<TransportResponse, forge_providers::TransportError> {
    Ok(TransportResponse { text: String::new(), tool_result: Some(tool_result), prompt_tokens: None, completion_tokens: None })
}

#[tokio::test]
async fn drives_the_canonical_graph_to_a_sealed_success() {
    let root = tempfile::tempdir().unwrap();
    let manager = RunManager::new(root.path());
    let spec = JobSpec::new("notes-app", "scaffold a todo app", "ollama").unwrap().with_concurrency(1).unwrap();

    // concurrency(1) makes `builder` and `docs` run one at a time, in the
    // lexicographic admission order the engine uses to break ties, so the
    // fake transport's queue can be laid out call-by-call.
    let transport: Arc<dyn ProviderTransport> = Arc::new(FakeTransport::new(vec![
        text_response("# Design\n\nA single-file todo app."),
        tool_response(json!({"files": [{"path": "main.py", "contents": "print('todo')"}]})),
        text_response("# notes-app\n\nA todo app."),
    ]));

    let job = run_job(&manager, "job-1", spec, "test-model", transport).await.unwrap();

    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.steps.len(), 4);
    for step in &job.steps {
        assert!(
            matches!(step.status, StepStatus::Succeeded | StepStatus::Cached),
            "step {} has status {:?}",
            step.step_name,
            step.status
        );
    }

    let run = manager.load("job-1").unwrap();
    assert!(run.outputs_dir().join("design.md").is_file());
    assert!(run.outputs_dir().join("README.md").is_file());
    assert!(run.outputs_dir().join("main.py").is_file());
    assert!(run.outputs_dir().join("qa_report.md").is_file());

    let events = std::fs::read_to_string(run.dir().join("events.jsonl")).unwrap();
    assert!(events.lines().count() >= 4, "expected at least a started/succeeded record per node");
    assert!(events.contains("job.succeeded"));

    assert!(!job.artifacts.is_empty());
    let qa_report = std::fs::read_to_string(run.outputs_dir().join("qa_report.md")).unwrap();
    assert!(qa_report.contains("PASS"));
}

#[tokio::test]
async fn a_provider_failure_seals_a_failed_job_without_erroring() {
    let root = tempfile::tempdir().unwrap();
    let manager = RunManager::new(root.path());
    let spec = JobSpec::new("notes-app", "scaffold a todo app", "ollama").unwrap().with_concurrency(1).unwrap();

    // `architect` is retried up to the engine's default budget; queue nothing
    // but failures so every attempt is exhausted and the job terminates
    // failed rather than hanging.
    let transport: Arc<dyn ProviderTransport> = Arc::new(FakeTransport::new(vec![
        Err(forge_providers::TransportError::InvalidResponse("no response".to_string())),
        Err(forge_providers::TransportError::InvalidResponse("no response".to_string())),
        Err(forge_providers::TransportError::InvalidResponse("no response".to_string())),
        Err(forge_providers::TransportError::InvalidResponse("no response".to_string())),
    ]));

    let job = run_job(&manager, "job-2", spec, "test-model", transport).await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    let architect = job.steps.iter().find(|s| s.step_name == "architect").unwrap();
    assert_eq!(architect.status, StepStatus::Failed);
    assert!(architect.failure.is_some());

    let docs = job.steps.iter().find(|s| s.step_name == "docs").unwrap();
    assert_eq!(docs.status, StepStatus::Skipped);
}
