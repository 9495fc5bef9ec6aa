//! Contract for parameter injectors.
//!
//! A `ParamInjector` receives a node's `base` params and the
//! `ExecutionContext` and returns a `Value` to be merged over the current
//! params. Injectors must be deterministic and side-effect free.

use crate::model::ExecutionContext;
use serde_json::Value;

pub trait ParamInjector: Send + Sync + std::fmt::Debug {
    /// Returns a JSON value to merge over `base`. Must be deterministic and
    /// cheap to compute.
    fn inject(&self, base: &Value, ctx: &ExecutionContext) -> Value;
}
