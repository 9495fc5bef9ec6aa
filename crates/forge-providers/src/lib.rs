//! forge-providers: uniform LLM backend contract with centralized
//! timeout/retry, generalizing the teacher's `MoleculeProvider`/
//! `DataProvider` async-trait-plus-named-implementations pattern from a
//! chemistry data source to an LLM generation backend.

pub mod adapter;
pub mod backends;
pub mod driver;
pub mod fake;
pub mod message;
pub mod options;
pub mod transport;

pub use adapter::{Adapter, ProviderAdapter};
pub use driver::{call_with_retry, AttemptOutcome, AttemptRecord, GenerateOutcome, ProviderCallError};
pub use fake::FakeTransport;
pub use message::{Message, Role};
pub use options::GenerateOptions;
pub use transport::{ProviderTransport, TransportError, TransportRequest, TransportResponse};
