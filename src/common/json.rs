//! Recursive operations over generic JSON values.
//!
//! Plugin hook and tool-server configs arrive as free-form JSON from several
//! sources (sidecar files, manifest inline objects, manifest-referenced
//! files) and are combined with one merge function rather than ad hoc
//! per-shape code.

use serde_json::Value;

/// Placeholder expanded to a plugin's installed root in every string value.
pub const PLUGIN_ROOT_VAR: &str = "${CLAUDE_PLUGIN_ROOT}";

/// Deep-merge `override_val` on top of `base`.
///
/// Objects merge key-by-key recursively, arrays concatenate, scalars (and
/// mismatched shapes) are overwritten by the override.
pub fn deep_merge(base: Value, override_val: Value) -> Value {
    match (base, override_val) {
        (Value::Object(mut base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (Value::Array(mut base_arr), Value::Array(override_arr)) => {
            base_arr.extend(override_arr);
            Value::Array(base_arr)
        }
        (_, override_val) => override_val,
    }
}

/// Substitute [`PLUGIN_ROOT_VAR`] with `root` in every string value,
/// recursing through nested objects and arrays.
pub fn expand_plugin_root(value: Value, root: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(PLUGIN_ROOT_VAR, root)),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, expand_plugin_root(v, root)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(
            arr.into_iter()
                .map(|v| expand_plugin_root(v, root))
                .collect(),
        ),
        other => other,
    }
}
