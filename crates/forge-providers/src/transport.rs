//! `ProviderTransport`: the injection seam between an adapter's centralized
//! timeout/retry policy and the actual backend call. Concrete backend I/O is
//! out of scope for this crate; only the contract is specified, matching the
//! teacher's trait-object provider pattern (`MoleculeProvider`,
//! `DataProvider`) where concrete implementations are swapped in by the
//! caller rather than hardcoded into the policy layer.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::options::GenerateOptions;

#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<Message>,
    pub options: GenerateOptions,
    /// Present for `tool_call`; the schema the structured result must match.
    pub tool_schema: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransportResponse {
    pub text: String,
    pub tool_result: Option<Value>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TransportError {
    #[error("provider call timed out")]
    Timeout,
    #[error("provider rate limit exceeded")]
    RateLimited,
    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),
    #[error("transport io error: {0}")]
    Io(String),
}

/// One backend call. A concrete transport owns the HTTP/IPC details; the
/// centralized timeout/retry loop in `driver` only ever talks to this trait.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}
