//! Optional strong-typing infrastructure layered over `Artifact`, keeping
//! the core itself agnostic. Lets a node describe its output as a concrete
//! type `T` with validation, without the engine knowing about it.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Artifact, ArtifactKind};

#[derive(Debug)]
pub enum ArtifactDecodeError {
    KindMismatch { expected: ArtifactKind, found: ArtifactKind },
    VersionMismatch { expected: u32, found: Option<u32> },
    Deserialize(String),
    Validation(String),
}

/// Abstract spec for a typed artifact. Implemented by data types that want
/// to expose themselves as safe artifacts.
pub trait ArtifactSpec: Sized + Serialize + DeserializeOwned + Clone {
    const KIND: ArtifactKind;
    /// Schema version; bump on incompatible changes.
    const SCHEMA_VERSION: u32 = 1;

    /// Lightweight, side-effect-free semantic validation. Optional.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Field name carrying the version inside the payload.
    fn version_field_name() -> &'static str {
        "schema_version"
    }

    /// Serializes to an unhashed `Artifact` (the engine fills in the hash).
    fn into_artifact(self) -> Artifact {
        let mut value = serde_json::to_value(&self).expect("serialize artifact spec");
        if let Value::Object(map) = &mut value {
            map.entry(Self::version_field_name().to_string()).or_insert(Value::from(Self::SCHEMA_VERSION));
        }
        Artifact::new_unhashed(Self::KIND, value, None)
    }

    /// Decodes from a neutral artifact, checking kind, version, and validation.
    fn from_artifact(a: &Artifact) -> Result<Self, ArtifactDecodeError> {
        if a.kind != Self::KIND {
            return Err(ArtifactDecodeError::KindMismatch { expected: Self::KIND, found: a.kind.clone() });
        }
        let found_version = a.payload.get(Self::version_field_name()).and_then(|v| v.as_u64()).map(|v| v as u32);
        match found_version {
            Some(v) if v == Self::SCHEMA_VERSION => {}
            Some(v) => return Err(ArtifactDecodeError::VersionMismatch { expected: Self::SCHEMA_VERSION, found: Some(v) }),
            None => return Err(ArtifactDecodeError::VersionMismatch { expected: Self::SCHEMA_VERSION, found: None }),
        }
        let decoded: Self =
            serde_json::from_value(a.payload.clone()).map_err(|e| ArtifactDecodeError::Deserialize(e.to_string()))?;
        decoded.validate().map_err(ArtifactDecodeError::Validation)?;
        Ok(decoded)
    }
}

/// Generic wrapper for an already-decoded typed artifact, useful in
/// polymorphic runtimes.
pub struct TypedArtifact<T: ArtifactSpec> {
    pub inner: T,
    pub raw: Artifact,
}

impl<T: ArtifactSpec + Clone> TypedArtifact<T> {
    pub fn new(inner: T) -> Self {
        Self { raw: inner.clone().into_artifact(), inner }
    }

    pub fn decode(raw: &Artifact) -> Result<Self, ArtifactDecodeError> {
        let inner = T::from_artifact(raw)?;
        Ok(Self { inner, raw: raw.clone() })
    }
}
