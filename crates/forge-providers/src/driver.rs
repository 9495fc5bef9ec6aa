//! Centralized timeout/retry policy shared by every concrete adapter.
//!
//! Identical across backends by design (spec: "Centralized policy,
//! identical across all adapters"): only the `TransportRequest` construction
//! and the `ProviderTransport` implementation vary per provider.

use std::time::{Duration, Instant};

use forge_models::{Failure, FailureKind};
use forge_retry::{decision_delay, ExponentialBackoff, RetryPolicy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::{ProviderTransport, TransportError, TransportRequest};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed { kind: FailureKind, message: String },
}

/// One `llm.request`/`llm.response` pair's worth of bookkeeping; the caller
/// (a step function in `forge-adapters`) turns these into events.
/// `delay_before_ms` is the backoff sleep that preceded this attempt (0 for
/// the first), which lets a caller reconstruct realistic event timestamps
/// after the fact instead of only at call-return time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub delay_before_ms: u64,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerateOutcome {
    pub text: String,
    pub tool_result: Option<Value>,
    pub attempts: Vec<AttemptRecord>,
}

/// `call_with_retry`'s error: the terminal `Failure` plus every attempt
/// made along the way, so a caller can still emit a full `llm.request` /
/// `llm.response` trail even when the call ultimately failed (spec.md
/// §4.4: "every attempt emits", not just successful ones).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProviderCallError {
    pub failure: Failure,
    pub attempts: Vec<AttemptRecord>,
}

fn map_failure_kind(err: &TransportError) -> FailureKind {
    match err {
        TransportError::Timeout => FailureKind::ProviderTimeout,
        TransportError::RateLimited => FailureKind::ProviderRateLimit,
        TransportError::InvalidResponse(_) => FailureKind::ProviderInvalidResponse,
        TransportError::Io(_) => FailureKind::IoError,
    }
}

/// Runs `request` against `transport`, retrying retryable failures with
/// `policy`'s backoff schedule up to `request.options.retries` times.
/// `seed` scopes jitter to this specific call (e.g. `"{job_id}:{node_id}"`)
/// so replays of the same job reproduce the same delays.
pub async fn call_with_retry(
    transport: &(dyn ProviderTransport),
    request: TransportRequest,
    policy: &ExponentialBackoff,
    seed: &str,
) -> Result<GenerateOutcome, ProviderCallError> {
    let max_retries = request.options.retries;
    let timeout = Duration::from_secs(request.options.timeout_s);
    let mut attempts = Vec::new();
    let mut attempt_index = 0u32;
    let mut delay_before_ms = 0u64;

    loop {
        attempt_index += 1;
        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, transport.send(&request)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let (kind, message) = match outcome {
            Ok(Ok(resp)) => {
                attempts.push(AttemptRecord { attempt: attempt_index, delay_before_ms, duration_ms, outcome: AttemptOutcome::Success });
                return Ok(GenerateOutcome { text: resp.text, tool_result: resp.tool_result, attempts });
            }
            Ok(Err(err)) => (map_failure_kind(&err), err.to_string()),
            Err(_elapsed) => (FailureKind::ProviderTimeout, "provider call timed out".to_string()),
        };

        attempts.push(AttemptRecord {
            attempt: attempt_index,
            delay_before_ms,
            duration_ms,
            outcome: AttemptOutcome::Failed { kind, message: message.clone() },
        });

        let retries_exhausted = attempt_index > max_retries;
        if !policy.should_retry(kind) || retries_exhausted {
            return Err(ProviderCallError {
                failure: Failure::new(kind, message).with_retry_count(attempt_index - 1),
                attempts,
            });
        }

        let decision = policy.decide(attempt_index, seed);
        let delay = decision_delay(&decision);
        delay_before_ms = delay.as_millis() as u64;
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeTransport;
    use crate::message::Message;
    use crate::options::GenerateOptions;
    use crate::transport::TransportResponse;

    fn request() -> TransportRequest {
        TransportRequest {
            provider: "ollama".into(),
            model: "test-model".into(),
            messages: vec![Message::user("hi")],
            options: GenerateOptions::default(),
            tool_schema: None,
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_try() {
        let transport = FakeTransport::new(vec![Ok(TransportResponse {
            text: "hello".into(),
            tool_result: None,
            prompt_tokens: Some(1),
            completion_tokens: Some(1),
        })]);
        let policy = ExponentialBackoff::new(forge_retry::BackoffParams { base_ms: 1, factor: 1.0, jitter: 0.0, max_retries: 3 });

        let outcome = call_with_retry(&transport, request(), &policy, "seed").await.unwrap();
        assert_eq!(outcome.text, "hello");
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let transport = FakeTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Ok(TransportResponse { text: "third time lucky".into(), tool_result: None, prompt_tokens: None, completion_tokens: None }),
        ]);
        let policy = ExponentialBackoff::new(forge_retry::BackoffParams { base_ms: 1, factor: 1.0, jitter: 0.0, max_retries: 3 });

        let outcome = call_with_retry(&transport, request(), &policy, "seed").await.unwrap();
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.text, "third time lucky");
    }

    #[tokio::test]
    async fn non_retryable_failure_bubbles_immediately() {
        let transport = FakeTransport::new(vec![Err(TransportError::InvalidResponse("bad schema".into()))]);
        let policy = ExponentialBackoff::new(forge_retry::BackoffParams { base_ms: 1, factor: 1.0, jitter: 0.0, max_retries: 3 });

        let err = call_with_retry(&transport, request(), &policy, "seed").await.unwrap_err();
        assert_eq!(err.failure.kind, FailureKind::ProviderInvalidResponse);
        assert_eq!(err.failure.retry_count, Some(0));
        assert_eq!(err.attempts.len(), 1);
    }

    #[tokio::test]
    async fn exhausts_retries_and_reports_count() {
        let transport = FakeTransport::new(vec![
            Err(TransportError::RateLimited),
            Err(TransportError::RateLimited),
            Err(TransportError::RateLimited),
            Err(TransportError::RateLimited),
        ]);
        let mut opts = GenerateOptions::default();
        opts.retries = 3;
        let req = TransportRequest { options: opts, ..request() };
        let policy = ExponentialBackoff::new(forge_retry::BackoffParams { base_ms: 1, factor: 1.0, jitter: 0.0, max_retries: 3 });

        let err = call_with_retry(&transport, req, &policy, "seed").await.unwrap_err();
        assert_eq!(err.failure.kind, FailureKind::ProviderRateLimit);
        assert_eq!(err.failure.retry_count, Some(3));
        assert_eq!(err.attempts.len(), 4);
    }
}
