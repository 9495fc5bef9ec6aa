//! Builder for `DagEngine`.
//!
//! Unlike the teacher's compile-time linear `Pipe`/`EngineBuilder` (which
//! enforced adjacent input/output types at compile time for a strictly
//! linear chain), a DAG's shape is only known at runtime: nodes declare
//! their dependencies by id, and `build_dag_definition` validates the graph
//! (unique ids, known dependencies, no cycles) once all nodes are added.

use std::sync::Arc;

use crate::event::EventStore;
use crate::repo::{build_dag_definition, DagRepository};
use crate::step::StepDefinition;

use super::core::DagEngine;

/// Accumulates nodes before building a `DagEngine` with a validated
/// `DagDefinition` as its default.
pub struct DagEngineBuilder<E: EventStore, R: DagRepository> {
    pub(crate) event_store: E,
    pub(crate) repository: R,
    pub(crate) nodes: Vec<Arc<dyn StepDefinition>>,
}

impl<E: EventStore, R: DagRepository> DagEngineBuilder<E, R> {
    #[inline]
    pub fn add_node<S>(mut self, node: S) -> Self
    where
        S: StepDefinition + 'static,
    {
        self.nodes.push(Arc::new(node));
        self
    }

    #[inline]
    pub fn add_node_arc(mut self, node: Arc<dyn StepDefinition>) -> Self {
        self.nodes.push(node);
        self
    }

    /// Validates the accumulated nodes into a `DagDefinition` and builds
    /// the engine with it set as the default definition.
    ///
    /// # Panics
    /// Panics if the DAG fails validation (duplicate id, unknown dependency,
    /// or a cycle) — callers that need to handle an invalid graph gracefully
    /// should call `try_build` instead.
    #[inline]
    pub fn build(self) -> DagEngine<E, R> {
        self.try_build().expect("invalid DAG definition")
    }

    pub fn try_build(self) -> Result<DagEngine<E, R>, crate::errors::OrchestratorError> {
        let definition = build_dag_definition(self.nodes)?;
        let mut engine = DagEngine::new_with_stores(self.event_store, self.repository);
        engine.set_default_definition(definition);
        Ok(engine)
    }
}
