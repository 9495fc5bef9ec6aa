//! The four named backends from spec.md §4.4: local inference engines
//! (`ollama`, `mlx`) and hosted APIs (`openai`, `anthropic`). Concrete
//! HTTP/IPC wiring is out of scope here (spec.md §1) — each constructor
//! only fixes the adapter's `provider_tag`; callers inject the real
//! `ProviderTransport` (or `FakeTransport` in tests).

use std::sync::Arc;

use crate::adapter::Adapter;
use crate::transport::ProviderTransport;

pub fn ollama(model: impl Into<String>, transport: Arc<dyn ProviderTransport>) -> Adapter {
    Adapter::new("ollama", model, transport)
}

pub fn openai(model: impl Into<String>, transport: Arc<dyn ProviderTransport>) -> Adapter {
    Adapter::new("openai", model, transport)
}

pub fn anthropic(model: impl Into<String>, transport: Arc<dyn ProviderTransport>) -> Adapter {
    Adapter::new("anthropic", model, transport)
}

pub fn mlx(model: impl Into<String>, transport: Arc<dyn ProviderTransport>) -> Adapter {
    Adapter::new("mlx", model, transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ProviderAdapter;
    use crate::fake::FakeTransport;
    use crate::message::Message;
    use crate::options::GenerateOptions;
    use crate::transport::TransportResponse;

    #[tokio::test]
    async fn each_backend_tags_its_requests() {
        let transport = Arc::new(FakeTransport::new(vec![Ok(TransportResponse {
            text: "ok".into(),
            tool_result: None,
            prompt_tokens: None,
            completion_tokens: None,
        })]));
        let adapter = ollama("llama3", transport);
        assert_eq!(adapter.provider_tag(), "ollama");

        let outcome = adapter.generate(&[Message::user("hi")], &GenerateOptions::default(), "seed").await.unwrap();
        assert_eq!(outcome.text, "ok");
    }
}
