//! Execution context handed to each node when it runs.
//!
//! `ExecutionContext` carries the artifacts produced by the node's upstream
//! dependencies (keyed by node name, since a DAG node can depend on more
//! than one predecessor) plus its canonicalized parameters. Helpers decode
//! both into strong types when the typed-step infrastructure is used.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::Artifact;
use crate::model::{ArtifactSpec, TypedArtifact};

pub struct ExecutionContext {
    /// Outputs of this node's dependencies, keyed by dependency node name.
    /// Empty for nodes with no dependencies.
    pub inputs: BTreeMap<String, Artifact>,
    pub params: Value,
}

impl ExecutionContext {
    /// Decodes the node's parameters into a strong type via serde.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.params.clone())
    }

    /// The single dependency's artifact, for nodes declared with exactly
    /// one upstream dependency. Returns `None` for source nodes or nodes
    /// with more than one dependency (use `inputs` directly for those).
    pub fn single_input(&self) -> Option<&Artifact> {
        if self.inputs.len() == 1 {
            self.inputs.values().next()
        } else {
            None
        }
    }

    /// Decodes the single dependency's artifact as a strong type `T`.
    pub fn input_typed<T: ArtifactSpec + Clone>(&self) -> Result<TypedArtifact<T>, String> {
        let a = self.single_input()
            .ok_or_else(|| "ExecutionContext has no single input (source node or multiple dependencies)".to_string())?;
        TypedArtifact::<T>::decode(a).map_err(|e| format!("TypedArtifact decode error: {:?}", e))
    }

    /// Decodes a named dependency's artifact as a strong type `T`.
    pub fn input_typed_named<T: ArtifactSpec + Clone>(&self, dep: &str) -> Result<TypedArtifact<T>, String> {
        let a = self.inputs.get(dep).ok_or_else(|| format!("no input from dependency '{dep}'"))?;
        TypedArtifact::<T>::decode(a).map_err(|e| format!("TypedArtifact decode error: {:?}", e))
    }

    /// Builds an `ExecutionContext` with a single anonymous input (test helper).
    pub fn from_payload_and_params(payload: serde_json::Value, params: serde_json::Value) -> Self {
        let mut inputs = BTreeMap::new();
        inputs.insert("_".to_string(), super::Artifact::new_unhashed(super::ArtifactKind::GenericJson, payload, None));
        Self { inputs, params }
    }
}
