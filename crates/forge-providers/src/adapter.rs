//! `ProviderAdapter`: the uniform contract independent of backend, and the
//! single `Adapter` implementation every named backend configures.

use std::sync::Arc;

use async_trait::async_trait;
use forge_retry::ExponentialBackoff;
use serde_json::Value;

use crate::driver::{call_with_retry, GenerateOutcome, ProviderCallError};
use crate::message::Message;
use crate::options::GenerateOptions;
use crate::transport::{ProviderTransport, TransportRequest};

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider_tag(&self) -> &str;

    async fn generate(&self, messages: &[Message], options: &GenerateOptions, seed: &str) -> Result<GenerateOutcome, ProviderCallError>;

    async fn tool_call(&self, name: &str, arguments: &Value, options: &GenerateOptions, seed: &str) -> Result<GenerateOutcome, ProviderCallError>;
}

/// Backend-agnostic adapter: holds a model id and an injected
/// `ProviderTransport`, and applies the centralized retry/timeout driver.
/// The four named constructors below (`ollama`, `openai`, `anthropic`,
/// `mlx`) only fix the `provider_tag`.
pub struct Adapter {
    provider_tag: &'static str,
    model: String,
    transport: Arc<dyn ProviderTransport>,
    policy: ExponentialBackoff,
}

impl Adapter {
    pub fn new(provider_tag: &'static str, model: impl Into<String>, transport: Arc<dyn ProviderTransport>) -> Self {
        Self { provider_tag, model: model.into(), transport, policy: ExponentialBackoff::default() }
    }

    pub fn with_policy(mut self, policy: ExponentialBackoff) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl ProviderAdapter for Adapter {
    fn provider_tag(&self) -> &str {
        self.provider_tag
    }

    async fn generate(&self, messages: &[Message], options: &GenerateOptions, seed: &str) -> Result<GenerateOutcome, ProviderCallError> {
        let request = TransportRequest {
            provider: self.provider_tag.to_string(),
            model: self.model.clone(),
            messages: messages.to_vec(),
            options: options.clone(),
            tool_schema: None,
        };
        call_with_retry(self.transport.as_ref(), request, &self.policy, seed).await
    }

    async fn tool_call(&self, name: &str, arguments: &Value, options: &GenerateOptions, seed: &str) -> Result<GenerateOutcome, ProviderCallError> {
        let request = TransportRequest {
            provider: self.provider_tag.to_string(),
            model: self.model.clone(),
            messages: vec![Message::user(format!("tool_call:{name}"))],
            options: options.clone(),
            tool_schema: Some(arguments.clone()),
        };
        call_with_retry(self.transport.as_ref(), request, &self.policy, seed).await
    }
}
