//! Builds the `FakeTransport` a run is driven against. Concrete backend
//! HTTP/IPC wiring is out of this core's scope (spec.md §1), so the CLI
//! demo path replays canned responses rather than calling a real provider.

use std::path::Path;

use anyhow::{Context, Result};
use forge_providers::{FakeTransport, TransportResponse};
use serde::Deserialize;

#[derive(Deserialize)]
struct FixtureResponse {
    #[serde(default)]
    text: String,
    #[serde(default)]
    tool_result: Option<serde_json::Value>,
}

/// Loads a JSON array of `{"text": "...", "tool_result": {...}}` objects,
/// replayed in order against each provider call the run makes.
pub fn load(path: &Path) -> Result<FakeTransport> {
    let bytes = std::fs::read(path).with_context(|| format!("reading fixture {}", path.display()))?;
    let responses: Vec<FixtureResponse> = serde_json::from_slice(&bytes).with_context(|| format!("parsing fixture {}", path.display()))?;
    let queue = responses
        .into_iter()
        .map(|r| Ok(TransportResponse { text: r.text, tool_result: r.tool_result, prompt_tokens: None, completion_tokens: None }))
        .collect();
    Ok(FakeTransport::new(queue))
}

/// The built-in fixture: enough responses, in the canonical graph's call
/// order (`architect`, `builder`, `docs`), for an unmodified run to succeed.
pub fn demo_graph() -> FakeTransport {
    FakeTransport::new(vec![
        Ok(TransportResponse {
            text: "# Design\n\nA minimal scaffold: one entry point module.".to_string(),
            tool_result: None,
            prompt_tokens: None,
            completion_tokens: None,
        }),
        Ok(TransportResponse {
            text: String::new(),
            tool_result: Some(serde_json::json!({
                "files": [{"path": "main.py", "contents": "def main():\n    print('hello')\n\n\nif __name__ == '__main__':\n    main()\n"}]
            })),
            prompt_tokens: None,
            completion_tokens: None,
        }),
        Ok(TransportResponse {
            text: "# Generated project\n\nRun `python main.py`.".to_string(),
            tool_result: None,
            prompt_tokens: None,
            completion_tokens: None,
        }),
    ])
}
