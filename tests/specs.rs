//! Black-box specifications for the `forge` CLI binary: invokes the
//! compiled binary and checks stdout/exit codes, mirroring the pack's
//! own `tests/specs.rs` convention of testing a CLI from the outside.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn forge(runs_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("forge").unwrap();
    cmd.arg("--runs-dir").arg(runs_dir);
    cmd
}

fn write_spec(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn run_with_the_built_in_fixture_succeeds_and_seals_a_run() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    let spec = write_spec(
        temp.path(),
        "job.json",
        r#"{"project":"notes-app","task_description":"scaffold a todo app","provider":"ollama"}"#,
    );

    forge(&runs_dir)
        .arg("run")
        .arg(&spec)
        .arg("--job-id")
        .arg("demo-1")
        .assert()
        .success()
        .stdout(predicate::str::contains("status:       Succeeded"));

    assert!(runs_dir.join("demo-1/manifest.json").is_file());
    assert!(runs_dir.join("demo-1/outputs/main.py").is_file());
}

#[test]
fn run_with_a_custom_fixture_file_replays_its_responses() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    let spec = write_spec(
        temp.path(),
        "job.json",
        r#"{"project":"notes-app","task_description":"scaffold a todo app","provider":"ollama","concurrency":1}"#,
    );
    let fixture = write_spec(
        temp.path(),
        "fixture.json",
        r#"[
            {"text": "# Design\n\nSingle file."},
            {"tool_result": {"files": [{"path": "main.py", "contents": "print('hi')\n"}]}},
            {"text": "# notes-app\n\nDocs."}
        ]"#,
    );

    forge(&runs_dir)
        .arg("run")
        .arg(&spec)
        .arg("--job-id")
        .arg("demo-2")
        .arg("--fixture")
        .arg(&fixture)
        .assert()
        .success();

    assert!(runs_dir.join("demo-2/outputs/main.py").is_file());
}

#[test]
fn running_the_same_job_id_twice_without_resume_fails_validation() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    let spec = write_spec(
        temp.path(),
        "job.json",
        r#"{"project":"notes-app","task_description":"scaffold a todo app","provider":"ollama"}"#,
    );

    forge(&runs_dir).arg("run").arg(&spec).arg("--job-id").arg("demo-3").assert().success();

    forge(&runs_dir)
        .arg("run")
        .arg(&spec)
        .arg("--job-id")
        .arg("demo-3")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn show_prints_the_sealed_manifest_summary() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    let spec = write_spec(
        temp.path(),
        "job.json",
        r#"{"project":"notes-app","task_description":"scaffold a todo app","provider":"ollama"}"#,
    );
    forge(&runs_dir).arg("run").arg(&spec).arg("--job-id").arg("demo-4").assert().success();

    forge(&runs_dir)
        .arg("show")
        .arg("demo-4")
        .assert()
        .success()
        .stdout(predicate::str::contains("job_id:       demo-4"));

    forge(&runs_dir)
        .arg("show")
        .arg("demo-4")
        .arg("--events")
        .assert()
        .success()
        .stdout(predicate::str::contains("job.succeeded"));
}

#[test]
fn show_an_unknown_job_id_fails() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    forge(&runs_dir).arg("show").arg("does-not-exist").assert().failure();
}

#[test]
fn list_runs_orders_most_recent_first_and_respects_limit() {
    let temp = tempfile::tempdir().unwrap();
    let runs_dir = temp.path().join("runs");
    let spec = write_spec(
        temp.path(),
        "job.json",
        r#"{"project":"notes-app","task_description":"scaffold a todo app","provider":"ollama"}"#,
    );

    for job_id in ["first", "second", "third"] {
        forge(&runs_dir).arg("run").arg(&spec).arg("--job-id").arg(job_id).assert().success();
    }

    forge(&runs_dir)
        .arg("list-runs")
        .arg("--limit")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("JOB_ID").and(predicate::str::contains("STATUS")));
}
