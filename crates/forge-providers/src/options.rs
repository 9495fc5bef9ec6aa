//! `GenerateOptions` — the fixed enumeration of invocation options every
//! adapter accepts, independent of backend.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    pub temperature: f64,
    pub max_tokens: u32,
    pub stop: Vec<String>,
    pub timeout_s: u64,
    pub retries: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { temperature: 0.1, max_tokens: 2048, stop: Vec::new(), timeout_s: 120, retries: 3 }
    }
}
