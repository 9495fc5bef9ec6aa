//! Step (DAG node) definitions: the neutral `StepDefinition` contract, the
//! typed `TypedStep` convenience layer for single-dependency nodes, runtime
//! status, and run results.

mod definition;
mod run_result;
mod status;
mod typed;

pub use definition::{StepDefinition, StepKind};
pub use run_result::StepRunResult;
pub use status::NodeStatus;
pub use typed::{StepRunResultTyped, TypedStep};
