//! Plain-text rendering for `show`/`list-runs` (spec.md §6). No table
//! library here, unlike the pack's fancier CLIs — this surface is small
//! enough that a handful of `println!`s stays readable.

use forge_models::{Event, Job};

pub fn print_summary(job: &Job) {
    println!("job_id:       {}", job.job_id);
    println!("project:      {}", job.spec.project);
    println!("provider:     {}", job.spec.provider);
    println!("status:       {:?}", job.status);
    println!("started_at:   {}", job.started_at.to_rfc3339());
    match job.completed_at {
        Some(ts) => println!("completed_at: {}", ts.to_rfc3339()),
        None => println!("completed_at: -"),
    }
    if let Some(end) = job.completed_at {
        let duration_s = (end - job.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        println!("duration_s:   {duration_s:.3}");
    }
    println!();
    println!("steps:");
    for step in &job.steps {
        let failure = step.failure.as_ref().map(|f| format!(" ({:?}: {})", f.kind, f.message)).unwrap_or_default();
        println!("  {:<10} {:?}{}", step.step_name, step.status, failure);
    }
    if !job.artifacts.is_empty() {
        println!();
        println!("files:");
        for artifact in &job.artifacts {
            println!("  {:<20} {:>8}B  {}  {}", artifact.path, artifact.size_bytes, &artifact.sha256[..12], artifact.produced_by);
        }
    }
}

pub fn print_events(events: &[Event]) {
    for event in events {
        let step = event.step.as_deref().unwrap_or("-");
        println!("{} {:?} {:<22} {:<10} {}", event.ts.to_rfc3339(), event.level, event.event_type, step, event.data);
    }
}

pub fn print_run_list(jobs: &[Job]) {
    println!("{:<24} {:<10} {:<12} {}", "JOB_ID", "STATUS", "DURATION_S", "STARTED_AT");
    for job in jobs {
        let duration = job
            .completed_at
            .map(|end| format!("{:.3}", (end - job.started_at).num_milliseconds().max(0) as f64 / 1000.0))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<10} {:<12} {}", job.job_id, format!("{:?}", job.status), duration, job.started_at.to_rfc3339());
    }
}
