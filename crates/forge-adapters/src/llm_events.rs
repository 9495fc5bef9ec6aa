//! Turns a `ProviderCallError`/`GenerateOutcome`'s `AttemptRecord` trail
//! into the `llm.request`/`llm.response` event pairs spec.md §4.4 requires
//! ("every attempt emits"), including attempts from calls that ultimately
//! failed. Shared by every step that talks to a provider, so the
//! timestamp-reconstruction logic (§8 scenario 3's backoff-visible-in-
//! timestamps check) lives in one place.

use chrono::{DateTime, Utc};
use forge_providers::{AttemptOutcome, AttemptRecord};
use serde_json::json;

use crate::artifact_store::ArtifactStore;

/// Emits one `llm.request`/`llm.response` pair per attempt, with each
/// pair's timestamps walking forward from `now` by `delay_before_ms` then
/// `duration_ms`, so replaying the trail reproduces the real relative
/// ordering and backoff deltas even though the attempts already happened.
pub fn emit_llm_events(artifacts: &ArtifactStore, step: &str, attempts: &[AttemptRecord]) {
    let mut clock = Utc::now();
    for record in attempts {
        clock += chrono::Duration::milliseconds(record.delay_before_ms as i64);
        emit_request(artifacts, step, clock, record);
        clock += chrono::Duration::milliseconds(record.duration_ms as i64);
        emit_response(artifacts, step, clock, record);
    }
}

fn emit_request(artifacts: &ArtifactStore, step: &str, ts: DateTime<Utc>, record: &AttemptRecord) {
    artifacts.emit_event_at(ts, "llm.request", Some(step), json!({"attempt": record.attempt}));
}

fn emit_response(artifacts: &ArtifactStore, step: &str, ts: DateTime<Utc>, record: &AttemptRecord) {
    let (success, failure_kind) = match &record.outcome {
        AttemptOutcome::Success => (true, None),
        AttemptOutcome::Failed { kind, .. } => (false, Some(format!("{kind:?}"))),
    };
    artifacts.emit_event_at(
        ts,
        "llm.response",
        Some(step),
        json!({
            "attempt": record.attempt,
            "duration_ms": record.duration_ms,
            "success": success,
            "failure_kind": failure_kind,
        }),
    );
}
