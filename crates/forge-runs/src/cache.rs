//! Filesystem-backed `NodeCache`: persists cached node outputs under a
//! run's `.cache/` subtree, keyed by fingerprint (spec.md §4.4).
//!
//! `NodeCache::put` has no `Result` in its contract (`forge-core` treats a
//! cache as a best-effort accelerator, not a source of truth), so a write
//! failure here is logged rather than propagated.

use std::path::PathBuf;

use forge_core::cache::NodeCache;
use forge_core::model::Artifact;

pub struct FsNodeCache {
    dir: PathBuf,
}

impl FsNodeCache {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }
}

impl NodeCache for FsNodeCache {
    fn get(&self, fingerprint: &str) -> Option<Vec<Artifact>> {
        let bytes = std::fs::read(self.entry_path(fingerprint)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn put(&mut self, fingerprint: &str, outputs: Vec<Artifact>) {
        let path = self.entry_path(fingerprint);
        match serde_json::to_vec(&outputs) {
            Ok(bytes) => {
                if let Err(err) = crate::fsutil::atomic_write(&path, &bytes) {
                    log::error!("failed to persist cache entry {fingerprint}: {err}");
                }
            }
            Err(err) => log::error!("failed to serialize cache entry {fingerprint}: {err}"),
        }
    }
}
