//! Shared test utilities for the stackguard workspace.
//!
//! Reports carry wall-clock timestamps and the tool version; integration tests compare runs
//! across processes, so they need one place that knows which fields to mask.

use serde_json::Value;

const TIMESTAMP: &str = "__TIMESTAMP__";

/// Normalize non-deterministic JSON fields for report comparison.
///
/// 1. **Root-only**: `tool.version` becomes `"__VERSION__"` only when the root object looks
///    like a report envelope (`schema`, `tool`, `run`, `verdict`, `findings`). A finding `data`
///    payload that happens to contain a `tool` object is left alone.
///
/// 2. **Recursive**: `started_at`, `ended_at` and `duration_ms` are masked at any depth.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        let is_envelope = ["schema", "tool", "run", "verdict", "findings"]
            .iter()
            .all(|k| obj.contains_key(*k));
        if is_envelope
            && let Some(tool_obj) = obj.get_mut("tool").and_then(Value::as_object_mut)
            && tool_obj.contains_key("version")
        {
            tool_obj.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    normalize_timestamps_recursive(&mut value);
    value
}

fn normalize_timestamps_recursive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in ["started_at", "ended_at"] {
                if let Some(v) = map.get_mut(key) {
                    *v = Value::String(TIMESTAMP.to_string());
                }
            }
            if let Some(v) = map.get_mut("duration_ms") {
                *v = Value::Number(0.into());
            }
            for val in map.values_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                normalize_timestamps_recursive(val);
            }
        }
        _ => {}
    }
}
