//! Pluggable cache seam used by `DagEngine` to short-circuit a node whose
//! fingerprint has already been computed (spec.md §4.4).
//!
//! `forge-core` only defines the contract and an in-memory reference
//! implementation for tests; `forge-runs` provides the durable,
//! filesystem-backed `Cache` that persists alongside a run's artifacts.

use std::collections::HashMap;

use crate::model::Artifact;

/// Looks up and stores node outputs keyed by fingerprint.
///
/// Implementations must be content-addressed: the same fingerprint always
/// maps to the same outputs, so a cache hit is safe to substitute for
/// re-execution.
pub trait NodeCache: Send + Sync {
    fn get(&self, fingerprint: &str) -> Option<Vec<Artifact>>;
    fn put(&mut self, fingerprint: &str, outputs: Vec<Artifact>);
}

#[derive(Default)]
pub struct InMemoryNodeCache {
    entries: HashMap<String, Vec<Artifact>>,
}

impl InMemoryNodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeCache for InMemoryNodeCache {
    fn get(&self, fingerprint: &str) -> Option<Vec<Artifact>> {
        self.entries.get(fingerprint).cloned()
    }

    fn put(&mut self, fingerprint: &str, outputs: Vec<Artifact>) {
        self.entries.insert(fingerprint.to_string(), outputs);
    }
}
