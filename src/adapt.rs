// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! Conversion of plain values into tree values.
//!
//! Every value that enters a store passes through [`adapt`] (via `Into<Value>`), so a plain
//! `serde_json` container can never end up inside the tree: objects become [`Map`]s and arrays
//! become [`Array`]s, all the way down. Values that already are tree values are stored as-is.
//!
//! Adapting does not notify anyone. The mutation that stores the adapted value notifies the store
//! exactly once, so filling a new nested container from existing data is one logical change.
use crate::value::{Array, Map, Value};

/// Recursively converts a plain `serde_json` value into a tree [`Value`].
pub fn adapt(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::Array(adapt_array(items)),
        serde_json::Value::Object(entries) => Value::Map(adapt_map(entries)),
    }
}

pub(crate) fn adapt_map(entries: serde_json::Map<String, serde_json::Value>) -> Map {
    entries.into_iter().map(|(k, v)| (k, adapt(v))).collect()
}

fn adapt_array(items: Vec<serde_json::Value>) -> Array {
    items.into_iter().map(adapt).collect()
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        adapt(value)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Map {
    fn from(entries: serde_json::Map<String, serde_json::Value>) -> Self {
        adapt_map(entries)
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

impl From<&Map> for serde_json::Value {
    fn from(map: &Map) -> Self {
        serde_json::Value::Object(map.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_pass_through() {
        assert_eq!(adapt(json!("neuer")), Value::String("neuer".into()));
        assert_eq!(adapt(json!(null)), Value::Null);
        assert_eq!(adapt(json!(1)), 1);
    }

    #[test]
    fn containers_are_adapted_all_the_way_down() {
        let value = adapt(json!({
            "subs": ["mueller", { "name": "robben", "tags": ["dutch"] }],
        }));
        let subs = value["subs"].as_array().expect("subs is an array");
        let robben = subs[1].as_map().expect("robben is a map");
        assert!(robben["tags"].as_array().is_some());
    }

    #[test]
    fn adapting_then_stripping_is_lossless() {
        let plain = json!({ "a": [1, 2.5, { "b": null }], "c": true });
        assert_eq!(serde_json::Value::from(adapt(plain.clone())), plain);
    }

    #[test]
    fn adapting_a_tree_value_is_the_identity() {
        let value = adapt(json!({ "a": [1] }));
        let again: Value = value.clone().into();
        assert_eq!(again, value);
    }
}
