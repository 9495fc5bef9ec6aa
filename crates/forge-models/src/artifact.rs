//! `Artifact` — one persisted file under a run's `outputs/` subtree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub media_type: String,
    pub produced_by: String,
}

impl Artifact {
    pub fn new(
        path: impl Into<String>,
        sha256: impl Into<String>,
        size_bytes: u64,
        media_type: impl Into<String>,
        produced_by: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
            size_bytes,
            media_type: media_type.into(),
            produced_by: produced_by.into(),
        }
    }
}
