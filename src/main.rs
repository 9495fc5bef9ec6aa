//! Demo binary wiring a sample job through the orchestration core end to
//! end: builds a `JobSpec`, drives it against a canned `FakeTransport`
//! (concrete provider I/O is out of this core's scope, spec.md §1), and
//! prints the sealed manifest. `forge-cli`'s `forge run` does the same
//! thing for a real caller; this binary exists to show the core working
//! without a spec file or CLI flags to set up first.

use std::sync::Arc;

use forge_models::JobSpec;
use forge_providers::{FakeTransport, ProviderTransport, TransportResponse};
use forge_runs::RunManager;

fn text(value: &str) -> Result<TransportResponse, forge_providers::TransportError> {
    Ok(TransportResponse { text: value.to_string(), tool_result: None, prompt_tokens: None, completion_tokens: None })
}

fn tool_call(value: serde_json::Value) -> Result<TransportResponse, forge_providers::TransportError> {
    Ok(TransportResponse { text: String::new(), tool_result: Some(value), prompt_tokens: None, completion_tokens: None })
}

#[tokio::main]
async fn main() {
    forge_runs::init_dotenv();
    env_logger::init();

    let runs_dir = std::env::temp_dir().join("forgekit-demo-runs");
    let manager = RunManager::new(&runs_dir);

    let spec = JobSpec::new("hello-cli", "scaffold a one-file greeting CLI", "ollama")
        .expect("literal project/provider values are always valid")
        .with_concurrency(1)
        .expect("concurrency 1 is always valid");

    let transport: Arc<dyn ProviderTransport> = Arc::new(FakeTransport::new(vec![
        text("# Design\n\nA single `main.py` that prints a greeting."),
        tool_call(serde_json::json!({
            "files": [{"path": "main.py", "contents": "print('hello from forgekit')\n"}]
        })),
        text("# hello-cli\n\nRun `python main.py` to print a greeting."),
    ]));

    log::info!("running demo job in {}", runs_dir.display());
    match forge_orchestrator::run_job(&manager, "hello-cli-demo", spec, "demo-model", transport).await {
        Ok(job) => {
            println!("job {} finished with status {:?}", job.job_id, job.status);
            for step in &job.steps {
                println!("  {:<10} {:?}", step.step_name, step.status);
            }
            for artifact in &job.artifacts {
                println!("  wrote {} ({} bytes)", artifact.path, artifact.size_bytes);
            }
        }
        Err(err) => {
            log::error!("demo run failed: {err}");
            eprintln!("demo run failed: {err}");
        }
    }
}
