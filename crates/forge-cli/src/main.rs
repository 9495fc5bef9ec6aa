//! `forge`: command-line entry point wiring a spec file to a sealed run
//! (spec.md §6 caller surface). `env_logger`-style initialization is the
//! standard complement to this workspace's `log` facade; every crate below
//! this binary only calls `log::{info,warn,error}`, leaving the actual
//! subscriber choice to the binary that links them.

mod fixture;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use forge_models::{JobSpec, JobStatus};
use forge_providers::FakeTransport;
use forge_runs::{RunConfig, RunManager};

#[derive(Parser)]
#[command(name = "forge", version, about = "Runs an LLM code-generation job spec to completion")]
struct Cli {
    /// Root directory runs are stored under; defaults to `RUNS_DIR`, then `runs`.
    #[arg(long, global = true)]
    runs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JobSpec file, create (or resume) its run, and execute it.
    Run(RunArgs),
    /// Print a run's manifest summary, or its event timeline with --events.
    Show(ShowArgs),
    /// List recent runs, most recently started first.
    ListRuns(ListRunsArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a JobSpec JSON file.
    spec_file: PathBuf,
    /// Resume an existing run sharing this job id instead of failing if one exists.
    #[arg(long)]
    resume: bool,
    /// Overrides the run's job id; defaults to the spec file's stem.
    #[arg(long)]
    job_id: Option<String>,
    /// Model identifier passed to the Provider Adapter.
    #[arg(long, default_value = "demo-model")]
    model: String,
    /// JSON file of canned provider responses (see `fixture` module); without
    /// one, a small built-in fixture drives the canonical graph to success.
    /// Concrete backend HTTP/IPC transports are out of this core's scope
    /// (spec.md §1), so `forge run` always executes against a fixture.
    #[arg(long)]
    fixture: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ShowArgs {
    job_id: String,
    /// Print the event timeline instead of the manifest summary.
    #[arg(long)]
    events: bool,
}

#[derive(clap::Args)]
struct ListRunsArgs {
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    forge_runs::init_dotenv();
    env_logger::init();

    let cli = Cli::parse();
    let config = RunConfig::from_env();
    let runs_dir = cli.runs_dir.unwrap_or_else(|| config.runs_dir.clone());
    let manager = match &config.cache_dir {
        Some(cache_dir) => RunManager::with_cache_root(&runs_dir, cache_dir),
        None => RunManager::new(&runs_dir),
    };

    let result = match cli.command {
        Commands::Run(args) => run_command(&manager, &config, args).await,
        Commands::Show(args) => show_command(&manager, args),
        Commands::ListRuns(args) => list_runs_command(&manager, args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(3)
        }
    }
}

async fn run_command(manager: &RunManager, config: &RunConfig, args: RunArgs) -> Result<ExitCode> {
    let mut spec = load_spec(&args.spec_file, config)?.with_resume(args.resume);
    let job_id = args.job_id.unwrap_or_else(|| default_job_id(&args.spec_file));

    let transport = Arc::new(match &args.fixture {
        Some(path) => fixture::load(path)?,
        None => {
            // The built-in fixture replays responses in the canonical graph's
            // call order (architect, then builder, then docs); that order is
            // only guaranteed when builder/docs can't run concurrently.
            spec = spec.with_concurrency(1).context("forcing concurrency for the built-in fixture")?;
            fixture::demo_graph()
        }
    });

    let cancel_flag = Arc::new(AtomicBool::new(false));
    let watcher_flag = cancel_flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("received interrupt, cancelling job");
            watcher_flag.store(true, Ordering::SeqCst);
        }
    });

    log::info!("running job '{job_id}' from {}", args.spec_file.display());
    let job = forge_orchestrator::run_job_cancellable(manager, &job_id, spec, &args.model, transport, Some(cancel_flag))
        .await
        .with_context(|| format!("running job '{job_id}'"))?;

    render::print_summary(&job);
    match job.status {
        JobStatus::Succeeded => Ok(ExitCode::from(0)),
        JobStatus::Failed => Ok(ExitCode::from(1)),
        JobStatus::Cancelled => Ok(ExitCode::from(2)),
        JobStatus::Pending | JobStatus::Running => {
            anyhow::bail!("job '{}' ended in non-terminal status {:?}", job.job_id, job.status)
        }
    }
}

fn show_command(manager: &RunManager, args: ShowArgs) -> Result<ExitCode> {
    let run = manager.load(&args.job_id).with_context(|| format!("loading run '{}'", args.job_id))?;
    if args.events {
        let events = run.event_log.read_all()?;
        render::print_events(&events);
    } else {
        let job = run.read_manifest()?;
        render::print_summary(&job);
    }
    Ok(ExitCode::from(0))
}

fn list_runs_command(manager: &RunManager, args: ListRunsArgs) -> Result<ExitCode> {
    let mut jobs = Vec::new();
    for job_id in manager.list_job_ids()? {
        let run = manager.load(&job_id)?;
        jobs.push(run.read_manifest()?);
    }
    jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    if let Some(limit) = args.limit {
        jobs.truncate(limit);
    }
    render::print_run_list(&jobs);
    Ok(ExitCode::from(0))
}

/// Loads a `JobSpec`, filling `provider`/`concurrency` from the ambient
/// `RunConfig` when the spec file omits them (spec.md §6: spec-file values
/// take precedence over environment variables).
fn load_spec(path: &std::path::Path, config: &RunConfig) -> Result<JobSpec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading spec file {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).with_context(|| format!("parsing spec file {}", path.display()))?;

    if let serde_json::Value::Object(ref mut map) = value {
        if !map.contains_key("provider") {
            if let Some(provider) = &config.provider {
                map.insert("provider".to_string(), serde_json::Value::String(provider.clone()));
            }
        }
        if !map.contains_key("concurrency") {
            if let Some(concurrency) = config.concurrency {
                map.insert("concurrency".to_string(), serde_json::json!(concurrency));
            }
        }
    }

    let spec: JobSpec = serde_json::from_value(value).context("spec file failed validation")?;
    spec.validate().context("spec file failed validation")?;
    Ok(spec)
}

fn default_job_id(spec_file: &std::path::Path) -> String {
    spec_file.file_stem().and_then(|s| s.to_str()).unwrap_or("job").to_string()
}
