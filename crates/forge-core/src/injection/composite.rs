//! `CompositeInjector`: applies a sequence of `ParamInjector`s
//! deterministically and returns the resulting params.

use crate::model::ExecutionContext;
use serde_json::Value;

use super::merge::merge_json;
use super::param_injector::ParamInjector;

#[derive(Debug)]
pub enum CompositeError {
    /// An injector failed to produce a value. Unused today, kept for future
    /// injectors that may need to report failure.
    InjectorFailed,
}

/// Applies a series of injectors in order, deterministically. Merge order
/// is: base -> injectors (in order).
#[derive(Debug)]
pub struct CompositeInjector {
    pub injectors: Vec<Box<dyn ParamInjector>>,
}

impl CompositeInjector {
    pub fn new() -> Self {
        Self { injectors: vec![] }
    }

    pub fn with_injectors(inj: Vec<Box<dyn ParamInjector>>) -> Self {
        Self { injectors: inj }
    }

    pub fn apply(&self, base: &Value, ctx: &ExecutionContext) -> Value {
        let mut accumulated = base.clone();
        for i in self.injectors.iter() {
            let v = i.inject(&accumulated, ctx);
            accumulated = merge_json(&accumulated, &v);
        }
        accumulated
    }

    /// Static variant that applies a slice of injectors without taking
    /// ownership, for callers that keep injectors owned elsewhere (e.g. the
    /// engine).
    pub fn apply_injectors(injectors: &[Box<dyn ParamInjector>], base: &Value, ctx: &ExecutionContext) -> Value {
        let mut accumulated = base.clone();
        for inj in injectors.iter() {
            let v = inj.inject(&accumulated, ctx);
            accumulated = merge_json(&accumulated, &v);
        }
        accumulated
    }
}

impl Default for CompositeInjector {
    fn default() -> Self {
        Self::new()
    }
}
