//! Layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: replace (last wins)
//! - Scalars: override (last wins)

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        // Extra pipeline args from a higher layer replace, never append
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

/// Insert `value` at a dot-separated path, creating intermediate objects.
pub(crate) fn set_path(root: &mut Value, path: &str, value: Value) {
    match root {
        Value::Object(map) => match path.split_once('.') {
            None => {
                map.insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                let child = map
                    .entry(head.to_string())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                set_path(child, rest, value);
            }
        },
        other => {
            *other = Value::Object(serde_json::Map::new());
            set_path(other, path, value);
        }
    }
}
