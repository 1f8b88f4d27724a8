#![deny(missing_docs)]

//! # Merge & Prune
//!
//! JSON tree helpers shared by units, actions and the assembler.
//!
//! - **Deep merge**: overlapping mapping keys merge recursively, anything else is
//!   overwritten by the later source.
//! - **Blank**: `null`, `""`, `[]` and `{}`. Nothing else (`false`, `0`) is blank.

use serde_json::{Map, Value};

/// Deep-merges `source` into `target`.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(t), Value::Object(s)) => deep_merge_maps(t, s),
        (t, s) => *t = s,
    }
}

/// Deep-merges two JSON objects, `source` winning on scalar conflicts.
pub fn deep_merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        let nested = value.is_object() && target.get(&key).is_some_and(Value::is_object);
        match target.get_mut(&key) {
            Some(existing) if nested => deep_merge(existing, value),
            _ => {
                target.insert(key, value);
            }
        }
    }
}

/// True for `null`, empty strings, empty arrays and empty objects.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Removes the top-level keys whose value is blank. Nested values are untouched.
pub fn prune_blank(map: &mut Map<String, Value>) {
    map.retain(|_, v| !is_blank(v));
}
