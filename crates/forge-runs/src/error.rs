//! Filesystem-backed Run Manager errors.
//!
//! Mirrors the teacher's `PersistenceError` role (a `thiserror` enum that
//! maps a backend's native failures onto semantic variants) with a
//! filesystem backend instead of Diesel/Postgres.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("run '{0}' not found")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
