//! Resolves a `JobSpec.provider` tag to a concrete `Adapter`, matching the
//! four named backends spec.md §4.4 defines. Concrete transport wiring
//! (HTTP, IPC) is the caller's concern; this only fixes the `provider_tag`.

use std::sync::Arc;

use forge_core::OrchestratorError;
use forge_providers::{backends, Adapter, ProviderTransport};

pub fn build_provider(tag: &str, model: &str, transport: Arc<dyn ProviderTransport>) -> Result<Adapter, OrchestratorError> {
    match tag {
        "ollama" => Ok(backends::ollama(model, transport)),
        "openai" => Ok(backends::openai(model, transport)),
        "anthropic" => Ok(backends::anthropic(model, transport)),
        "mlx" => Ok(backends::mlx(model, transport)),
        other => Err(OrchestratorError::ValidationError(format!("unknown provider '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_providers::{FakeTransport, ProviderAdapter};

    #[test]
    fn resolves_known_tags() {
        let transport = Arc::new(FakeTransport::new(vec![]));
        for tag in ["ollama", "openai", "anthropic", "mlx"] {
            let adapter = build_provider(tag, "test-model", transport.clone()).unwrap();
            assert_eq!(adapter.provider_tag(), tag);
        }
    }

    #[test]
    fn rejects_unknown_tag() {
        let transport = Arc::new(FakeTransport::new(vec![]));
        let err = build_provider("bogus", "test-model", transport).unwrap_err();
        assert!(matches!(err, OrchestratorError::ValidationError(_)));
    }
}
