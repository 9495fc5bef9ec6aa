//! forge-retry: exponential backoff shared by the Provider Adapter and the
//! DAG Executor's node-level retry.
//!
//! Mirrors the teacher's `chem-policies` role: a small, deterministic,
//! auditable decision policy rather than ad-hoc retry loops scattered across
//! callers. Where the teacher chose a property candidate by score with a
//! stable tie-break, this crate chooses a delay by attempt number with a
//! stable (hash-derived) jitter, so two runs with the same seed reproduce
//! the same backoff schedule.

use std::time::Duration;

use forge_models::FailureKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Backoff parameters. `base` and `factor` compose as `base * factor^attempt`;
/// `jitter` is the maximum fractional deviation applied on top (±20% by
/// default), derived deterministically from `(seed, attempt)` rather than a
/// random generator, so the schedule is reproducible given the same inputs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct BackoffParams {
    pub base_ms: u64,
    pub factor: f64,
    pub jitter: f64,
    pub max_retries: u32,
}

impl Default for BackoffParams {
    fn default() -> Self {
        Self { base_ms: 1_000, factor: 2.0, jitter: 0.2, max_retries: 3 }
    }
}

/// A computed retry decision, kept around for the event log / manifest
/// (`retry_count`, the delay actually applied) rather than recomputed at
/// read time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BackoffDecision {
    pub policy_id: String,
    pub attempt: u32,
    pub base_delay_ms: u64,
    pub jittered_delay_ms: u64,
}

pub trait RetryPolicy {
    fn id(&self) -> &'static str;

    /// Whether a failure of this kind should be retried at all, independent
    /// of the attempt budget.
    fn should_retry(&self, kind: FailureKind) -> bool {
        kind.is_retryable()
    }

    /// The delay to wait before `attempt` (1-based: the first retry is
    /// attempt 1), given a `seed` that scopes the jitter to a specific node
    /// invocation so repeated runs of the same job reproduce the same
    /// schedule.
    fn decide(&self, attempt: u32, seed: &str) -> BackoffDecision;
}

/// `base_ms * factor^(attempt - 1)`, jittered by a hash-derived offset in
/// `[-jitter, +jitter]` of the base delay (base 1s, factor 2, jitter ±20%).
pub struct ExponentialBackoff {
    params: BackoffParams,
}

impl ExponentialBackoff {
    pub fn new(params: BackoffParams) -> Self {
        Self { params }
    }

    pub fn max_retries(&self) -> u32 {
        self.params.max_retries
    }

    /// Deterministic jitter fraction in `[-1.0, 1.0]`, derived from a SHA-256
    /// digest of `seed`/`attempt` rather than a random generator.
    fn jitter_fraction(seed: &str, attempt: u32) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(attempt.to_be_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        let n = u64::from_be_bytes(bytes);
        (n as f64 / u64::MAX as f64) * 2.0 - 1.0
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(BackoffParams::default())
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn id(&self) -> &'static str {
        "exponential_backoff"
    }

    fn decide(&self, attempt: u32, seed: &str) -> BackoffDecision {
        let exponent = attempt.saturating_sub(1);
        let base_delay_ms = (self.params.base_ms as f64 * self.params.factor.powi(exponent as i32)) as u64;
        let fraction = Self::jitter_fraction(seed, attempt) * self.params.jitter;
        let jittered = base_delay_ms as f64 * (1.0 + fraction);
        BackoffDecision {
            policy_id: self.id().to_string(),
            attempt,
            base_delay_ms,
            jittered_delay_ms: jittered.max(0.0) as u64,
        }
    }
}

/// Converts a `BackoffDecision` into a `Duration` for callers that sleep on
/// it directly (the Provider Adapter's retry loop).
pub fn decision_delay(decision: &BackoffDecision) -> Duration {
    Duration::from_millis(decision.jittered_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially() {
        let policy = ExponentialBackoff::default();
        let d1 = policy.decide(1, "node-a");
        let d2 = policy.decide(2, "node-a");
        let d3 = policy.decide(3, "node-a");
        assert_eq!(d1.base_delay_ms, 1_000);
        assert_eq!(d2.base_delay_ms, 2_000);
        assert_eq!(d3.base_delay_ms, 4_000);
    }

    #[test]
    fn jitter_is_bounded_and_deterministic() {
        let policy = ExponentialBackoff::default();
        let d1 = policy.decide(2, "node-a");
        let d2 = policy.decide(2, "node-a");
        assert_eq!(d1.jittered_delay_ms, d2.jittered_delay_ms, "same seed+attempt must reproduce the same delay");

        let lower = (d1.base_delay_ms as f64 * 0.8) as u64;
        let upper = (d1.base_delay_ms as f64 * 1.2) as u64;
        assert!(d1.jittered_delay_ms >= lower && d1.jittered_delay_ms <= upper);
    }

    #[test]
    fn different_seeds_can_diverge() {
        let policy = ExponentialBackoff::default();
        let a = policy.decide(1, "node-a");
        let b = policy.decide(1, "node-b");
        assert_ne!(a.jittered_delay_ms, b.jittered_delay_ms);
    }

    #[test]
    fn should_retry_follows_failure_kind() {
        let policy = ExponentialBackoff::default();
        assert!(policy.should_retry(FailureKind::ProviderTimeout));
        assert!(!policy.should_retry(FailureKind::ProviderInvalidResponse));
    }
}
