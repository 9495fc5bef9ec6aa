//! Inputs to a node's fingerprint.
//!
//! This is the pre-canonicalization shape hashed to obtain a deterministic
//! fingerprint for a node execution, depending on: engine version, node id,
//! dependency output hashes, params, and the DAG definition hash. This is
//! also the shape the Cache (spec.md §4.4) hashes to derive a cache key.

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct NodeFingerprintInput<'a> {
    pub engine_version: &'a str,
    pub node_id: &'a str,
    /// Dependency output hashes, lexicographically ordered by dependency
    /// name before this struct is built, so reordering dependency
    /// declarations never changes the fingerprint.
    pub input_hashes: &'a [String],
    pub params: &'a Value,
    pub definition_hash: &'a str,
}
