/// Runtime status of a DAG node.
///
/// Valid transitions:
/// - `Pending` -> `Running`
/// - `Running` -> `Succeeded` | `Cached` | `Failed`
/// - `Pending` -> `Skipped` (a dependency failed or was cancelled)
///
/// No reversals or arbitrary jumps between states, except the explicit
/// `Failed` -> `Pending` transition applied by `RetryScheduled` replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Pending,
    Running,
    Succeeded,
    /// Output served from the Cache without re-executing.
    Cached,
    Failed,
    /// Never ran because an upstream dependency failed or was cancelled.
    Skipped,
}
