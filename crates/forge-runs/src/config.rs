//! `RunConfig`: environment-derived configuration, loaded once.
//!
//! Keeps the teacher's `DbConfig::from_env` shape (`once_cell::Lazy` +
//! `dotenvy::dotenv()` lazy-load idiom) but the env vars it reads are the
//! orchestration core's own (`PROVIDER`, `CONCURRENCY`, `CACHE_DIR`), not a
//! database connection string.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub provider: Option<String>,
    pub concurrency: Option<u32>,
    /// Absolute path override for the run cache (spec.md §6 `CACHE_DIR`).
    /// `None` means every run keeps caching under its own `.cache/`.
    pub cache_dir: Option<PathBuf>,
    pub runs_dir: PathBuf,
}

impl RunConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let provider = env::var("PROVIDER").ok();
        let concurrency = env::var("CONCURRENCY").ok().and_then(|v| v.parse().ok());
        let cache_dir = env::var("CACHE_DIR").ok().map(PathBuf::from);
        let runs_dir = env::var("RUNS_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("runs"));
        Self { provider, concurrency, cache_dir, runs_dir }
    }
}

/// Forces early `.env` loading from external callers (the CLI entry point).
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
