//! Deterministic JSON parameter merging.
//!
//! Shallow merge: keys from `b` override keys from `a`. Nested objects are
//! not merged recursively; this keeps the semantics simple and predictable.

use serde_json::Value;

/// Shallow merge: keys from `b` override keys from `a` when both are
/// objects. When either side is not an object, `b` wins outright.
pub fn merge_json(a: &Value, b: &Value) -> Value {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            let mut out = ma.clone();
            for (k, v) in mb.iter() {
                out.insert(k.clone(), v.clone());
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}
