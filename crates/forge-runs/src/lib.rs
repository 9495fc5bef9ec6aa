//! forge-runs: the filesystem-backed Run Manager.
//!
//! Generalizes the teacher's `chem-persistence` role (a storage backend
//! behind the core's `EventStore`/`FlowRepository` seams) from Postgres
//! over Diesel to a plain run-folder layout on disk: a run is a directory,
//! its manifest is a JSON file rewritten atomically, and its event log is
//! an append-only JSONL file.

pub mod cache;
pub mod config;
pub mod error;
pub mod event_log;
mod fsutil;
pub mod run;

pub use cache::FsNodeCache;
pub use config::{init_dotenv, RunConfig};
pub use error::PersistenceError;
pub use event_log::{EventFilter, JsonlEventLog};
pub use run::{Run, RunManager};
