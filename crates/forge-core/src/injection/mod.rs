//! Deterministic parameter injection.
//!
//! Offers a contract for applying parameter injectors on top of a node's
//! `base` params before it runs, so deterministic extensions (e.g. adding
//! runtime context) can be layered in without changing a node's own
//! semantics.
//!
//! Submodules:
//! - `param_injector`: the `ParamInjector` trait.
//! - `composite`: `CompositeInjector`, applies a list of injectors in order.
//! - `merge`: `merge_json` helper for JSON merges.

pub mod composite;
pub mod merge;
pub mod param_injector;

pub use composite::CompositeInjector;
pub use merge::merge_json;
pub use param_injector::ParamInjector;
