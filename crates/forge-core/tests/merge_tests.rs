//! Tests for the JSON merge utility (param injection)
//!
//! Verifies shallow semantics: keys in `b` override keys in `a`.

use forge_core::injection::merge_json;
use serde_json::json;

#[test]
fn merge_shallow_overrides_keys() {
    let a = json!({"x": 1, "y": {"z": 3}, "keep": "a"});
    let b = json!({"x": 2, "y": "replaced", "new": true});

    let out = merge_json(&a, &b);

    // simple keys are overridden
    assert_eq!(out["x"], json!(2));
    // when b has a non-object type it replaces wholesale
    assert_eq!(out["y"], json!("replaced"));
    // keys only present in a are kept
    assert_eq!(out["keep"], json!("a"));
    // new keys in b appear
    assert_eq!(out["new"], json!(true));
}
