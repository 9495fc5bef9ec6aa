//! Strongly-typed node interface for the common case: zero or one
//! dependency. Nodes with more than one dependency (like `qa`, which reads
//! both `builder` and `docs`) implement `StepDefinition` directly instead.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::{StepKind, StepRunResult};
use crate::errors::OrchestratorError;
use crate::model::ArtifactSpec;

pub enum StepRunResultTyped<Out: ArtifactSpec + Clone> {
    Success { outputs: Vec<Out> },
    Failure { error: OrchestratorError },
}

impl<Out: ArtifactSpec + Clone> StepRunResultTyped<Out> {
    pub fn into_neutral(self) -> StepRunResult {
        match self {
            StepRunResultTyped::Success { outputs } => {
                StepRunResult::Success { outputs: outputs.into_iter().map(|o| o.into_artifact()).collect() }
            }
            StepRunResultTyped::Failure { error } => StepRunResult::Failure { error },
        }
    }
}

/// High-level interface for defining nodes strongly typed over
/// Params/Input/Output.
///
/// - No string-keyed access to parameters — serde decodes into `Params`.
/// - No dynamic JSON for I/O — uses `ArtifactSpec` input/output types.
/// - The engine bridges this to the neutral `StepDefinition` interface.
#[async_trait]
pub trait TypedStep: Send + Sync {
    type Params: DeserializeOwned + Serialize + Clone + Default + Send;
    type Input: ArtifactSpec + Clone;
    type Output: ArtifactSpec + Clone;

    fn id(&self) -> &'static str;
    fn name(&self) -> &str {
        self.id()
    }
    /// Upstream node id this node reads `Input` from, or `None` for a
    /// source node.
    fn dependency(&self) -> Option<&'static str> {
        None
    }
    fn kind(&self) -> StepKind;
    fn retryable(&self) -> bool {
        true
    }
    fn params_default(&self) -> Self::Params {
        Default::default()
    }

    /// `input` is `None` for a source node.
    async fn run_typed(&self, input: Option<Self::Input>, params: Self::Params) -> StepRunResultTyped<Self::Output>;
}

#[async_trait]
impl<T> crate::step::StepDefinition for T
where
    T: TypedStep + 'static,
{
    fn id(&self) -> &str {
        TypedStep::id(self)
    }
    fn name(&self) -> &str {
        <Self as TypedStep>::name(self)
    }
    fn dependencies(&self) -> Vec<String> {
        self.dependency().map(|d| vec![d.to_string()]).unwrap_or_default()
    }
    fn base_params(&self) -> serde_json::Value {
        serde_json::to_value(self.params_default()).expect("serialize default params")
    }
    fn retryable(&self) -> bool {
        <Self as TypedStep>::retryable(self)
    }
    fn kind(&self) -> StepKind {
        <Self as TypedStep>::kind(self)
    }
    async fn run(&self, ctx: &crate::model::ExecutionContext) -> StepRunResult {
        let params: <Self as TypedStep>::Params = ctx.params_as().unwrap_or_else(|_| self.params_default());
        let typed_in: Option<<Self as TypedStep>::Input> = match ctx.single_input() {
            Some(a) => Some(<Self as TypedStep>::Input::from_artifact(a).expect("input artifact decode")),
            None => None,
        };
        <Self as TypedStep>::run_typed(self, typed_in, params).await.into_neutral()
    }
}
