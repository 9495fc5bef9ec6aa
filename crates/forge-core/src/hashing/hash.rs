//! Hash helpers, kept behind a small API so the algorithm can change without
//! touching callers.
//!
//! Uses SHA-256: artifact and cache fingerprints are persisted in manifests
//! and compared across runs, so the digest format needs to match what
//! external tooling around the run directory expects.

use crate::hashing::to_canonical_json;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hashes a string and returns its hex digest.
pub fn hash_str(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes a JSON value after canonicalizing it.
pub fn hash_value(v: &Value) -> String {
    let canonical = to_canonical_json(v);
    hash_str(&canonical)
}
