//! DAG execution engine: `DagEngine`, its builder, and the bounded
//! concurrency admission loop that drives a job to completion.

pub mod builder;
pub mod core;

pub use builder::DagEngineBuilder;
pub use core::DagEngine;

pub use crate::event::{EventStore, ExecEvent, ExecEventKind, InMemoryEventStore};
pub use crate::repo::{DagDefinition, DagRepository, InMemoryDagRepository};
pub use crate::step::{NodeStatus, StepRunResult};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OrchestratorError;
    use crate::step::{StepKind, TypedStep};
    use crate::{typed_artifact, StepRunResultTyped};
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    typed_artifact!(JsonSpec { value: serde_json::Value });

    #[derive(Clone, Debug)]
    struct SourceStep;

    #[async_trait]
    impl TypedStep for SourceStep {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "source"
        }
        fn kind(&self) -> StepKind {
            StepKind::Source
        }
        async fn run_typed(&self, _input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            StepRunResultTyped::Success { outputs: vec![JsonSpec { value: json!({ "data": "hello world" }), schema_version: 1 }] }
        }
    }

    #[derive(Clone, Debug)]
    struct TransformStep;

    #[async_trait]
    impl TypedStep for TransformStep {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "transform"
        }
        fn dependency(&self) -> Option<&'static str> {
            Some("source")
        }
        fn kind(&self) -> StepKind {
            StepKind::Transform
        }
        async fn run_typed(&self, input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            let inp = input.expect("transform requires input");
            let transformed = json!({ "transformed": inp.value["data"], "processed": true });
            StepRunResultTyped::Success { outputs: vec![JsonSpec { value: transformed, schema_version: 1 }] }
        }
    }

    #[derive(Clone, Debug)]
    struct SinkStep;

    #[async_trait]
    impl TypedStep for SinkStep {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "sink"
        }
        fn dependency(&self) -> Option<&'static str> {
            Some("transform")
        }
        fn kind(&self) -> StepKind {
            StepKind::Sink
        }
        async fn run_typed(&self, input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            let inp = input.expect("sink requires input");
            StepRunResultTyped::Success { outputs: vec![JsonSpec { value: inp.value.clone(), schema_version: 1 }] }
        }
    }

    #[tokio::test]
    async fn linear_dag_runs_to_completion() {
        let mut engine = DagEngine::new().add_node(SourceStep).add_node(TransformStep).add_node(SinkStep).build();

        let job_id = engine.run().await.expect("dag should complete successfully");
        assert!(!job_id.to_string().is_empty());

        let events = engine.events().expect("events should exist");
        assert!(events.iter().any(|e| matches!(e.kind, ExecEventKind::JobCompleted { .. })));
    }

    #[derive(Clone, Debug)]
    struct FailingStep;

    #[async_trait]
    impl TypedStep for FailingStep {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "fails"
        }
        fn kind(&self) -> StepKind {
            StepKind::Source
        }
        fn retryable(&self) -> bool {
            false
        }
        async fn run_typed(&self, _input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            StepRunResultTyped::Failure { error: OrchestratorError::ValidationError("always fails".into()) }
        }
    }

    #[derive(Clone, Debug)]
    struct DependsOnFailing;

    #[async_trait]
    impl TypedStep for DependsOnFailing {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "downstream"
        }
        fn dependency(&self) -> Option<&'static str> {
            Some("fails")
        }
        fn kind(&self) -> StepKind {
            StepKind::Sink
        }
        async fn run_typed(&self, input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            StepRunResultTyped::Success { outputs: vec![JsonSpec { value: input.expect("unreachable").value, schema_version: 1 }] }
        }
    }

    #[tokio::test]
    async fn dependency_failure_skips_downstream_node() {
        let mut engine = DagEngine::new().add_node(FailingStep).add_node(DependsOnFailing).build();

        let job_id = engine.run().await.expect("dag should still reach a terminal state");
        let events = engine.events().expect("events should exist");

        assert!(events.iter().any(|e| matches!(&e.kind, ExecEventKind::NodeFailed { node_id, .. } if node_id == "fails")));
        assert!(events.iter().any(|e| matches!(&e.kind, ExecEventKind::NodeSkipped { node_id, upstream } if node_id == "downstream" && upstream == "fails")));
        assert!(events.iter().any(|e| matches!(e.kind, ExecEventKind::JobCompleted { .. })));
        assert!(!job_id.to_string().is_empty());
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_rerun() {
        let mut engine = DagEngine::new().add_node(SourceStep).build();
        let definition = engine.default_definition().expect("default definition set by build()").clone();

        let job_id = Uuid::new_v4();
        engine.run_job(job_id, &definition).await.expect("first run succeeds");
        let first_events = engine.events_for(job_id);
        assert!(first_events.iter().any(|e| matches!(e.kind, ExecEventKind::NodeFinished { .. })));

        // A second job against the same definition (and thus same
        // fingerprint, since SourceStep has no inputs/params) should hit the
        // cache rather than re-running.
        let job_id_2 = Uuid::new_v4();
        engine.run_job(job_id_2, &definition).await.expect("second run succeeds");
        let second_events = engine.events_for(job_id_2);
        assert!(second_events.iter().any(|e| matches!(e.kind, ExecEventKind::NodeCached { .. })));
        assert!(second_events.iter().any(|e| matches!(e.kind, ExecEventKind::CacheHit { .. })));
    }

    #[tokio::test]
    async fn first_run_of_a_node_is_a_cache_miss() {
        let mut engine = DagEngine::new().add_node(SourceStep).build();
        let job_id = engine.run().await.expect("dag should complete successfully");
        let events = engine.events_for(job_id);
        assert!(events.iter().any(|e| matches!(&e.kind, ExecEventKind::CacheMiss { node_id, .. } if node_id == "source")));
    }

    #[derive(Clone, Debug)]
    struct SlowStep;

    #[async_trait]
    impl TypedStep for SlowStep {
        type Params = ();
        type Input = JsonSpec;
        type Output = JsonSpec;

        fn id(&self) -> &'static str {
            "slow"
        }
        fn kind(&self) -> StepKind {
            StepKind::Source
        }
        fn retryable(&self) -> bool {
            false
        }
        fn timeout(&self) -> std::time::Duration {
            std::time::Duration::from_millis(20)
        }
        async fn run_typed(&self, _input: Option<Self::Input>, _params: Self::Params) -> StepRunResultTyped<Self::Output> {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            StepRunResultTyped::Success { outputs: vec![JsonSpec { value: json!({}), schema_version: 1 }] }
        }
    }

    #[tokio::test]
    async fn a_node_that_exceeds_its_timeout_fails_the_job() {
        let mut engine = DagEngine::new().add_node(SlowStep).build();
        let job_id = engine.run().await.expect("dag should still reach a terminal state");
        let events = engine.events_for(job_id);
        assert!(events.iter().any(|e| matches!(&e.kind, ExecEventKind::NodeFailed { node_id, error, .. }
            if node_id == "slow" && error.to_string().contains("timeout"))));
    }

    #[tokio::test]
    async fn an_external_cancel_flag_stops_the_job() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let mut engine = DagEngine::new().add_node(SourceStep).add_node(TransformStep).build();
        let flag = Arc::new(AtomicBool::new(true));
        engine.set_cancel_flag(flag);

        let err = engine.run().await.expect_err("a set cancel flag should stop the job");
        assert!(matches!(err, OrchestratorError::JobCancelled));

        let job_id = engine.default_job_id().expect("default job id set during run");
        let events = engine.events_for(job_id);
        assert!(events.iter().any(|e| matches!(e.kind, ExecEventKind::JobCancelled)));
    }
}
