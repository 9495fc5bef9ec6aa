//! `FakeTransport`: a deterministic stand-in for a real provider backend,
//! used across this crate's tests and the root demo binary — the pack's
//! recurring "named mock implementation of the trait" idiom (e.g. the
//! teacher's `MockMoleculeProvider`).

use std::sync::Mutex;

use async_trait::async_trait;
use std::collections::VecDeque;

use crate::transport::{ProviderTransport, TransportError, TransportRequest, TransportResponse};

/// Replays a fixed queue of responses, one per call, regardless of the
/// request's contents. Once exhausted, every further call reports an
/// `InvalidResponse` so a misconfigured test fails loudly rather than
/// hanging.
pub struct FakeTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
}

impl FakeTransport {
    pub fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self { responses: Mutex::new(responses.into()) }
    }
}

#[async_trait]
impl ProviderTransport for FakeTransport {
    async fn send(&self, _request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut queue = self.responses.lock().expect("fake transport mutex poisoned");
        queue.pop_front().unwrap_or_else(|| Err(TransportError::InvalidResponse("FakeTransport queue exhausted".into())))
    }
}
