//! Composes the canonical step graph (spec.md §4.7):
//!
//! ```text
//! architect ──► builder ──┐
//!           └──► docs ────┴──► qa
//! ```
//!
//! `architect`/`builder`/`docs` keep the engine's default 3-retry policy;
//! `qa` opts out via its own `retryable() == false`.

use std::sync::Arc;

use forge_adapters::steps::{ArchitectStep, BuilderStep, DocsStep, QaStep};
use forge_adapters::{ArtifactStore, JobSpecInjector};
use forge_core::{DagEngine, InMemoryDagRepository, InMemoryEventStore, OrchestratorError};
use forge_models::JobSpec;
use forge_providers::ProviderAdapter;

pub const MAX_RETRIES: u32 = 3;

pub fn build_engine(
    spec: &JobSpec,
    provider: Arc<dyn ProviderAdapter>,
    artifacts: Arc<ArtifactStore>,
) -> Result<DagEngine<InMemoryEventStore, InMemoryDagRepository>, OrchestratorError> {
    let mut engine = DagEngine::builder(InMemoryEventStore::default(), InMemoryDagRepository::new())
        .add_node(ArchitectStep::new(provider.clone(), artifacts.clone()))
        .add_node(BuilderStep::new(provider.clone(), artifacts.clone()))
        .add_node(DocsStep::new(provider.clone(), artifacts.clone()))
        .add_node(QaStep::new(artifacts.clone()))
        .try_build()?;

    engine.add_injector(Box::new(JobSpecInjector::new(spec)));
    engine.set_max_concurrency(spec.concurrency.max(1) as usize);
    engine.set_max_retries(MAX_RETRIES);
    Ok(engine)
}
