//! Constants that participate in fingerprint computation.
//!
//! Bumping `ENGINE_VERSION` invalidates every previously computed step
//! fingerprint, even when node definitions and inputs are unchanged — this
//! is by design, since it is included in the fingerprint input.

pub const ENGINE_VERSION: &str = "forge-core.1";
