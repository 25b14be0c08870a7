//! Helpers for unpacking `commands/call` parameters

use serde_json::Value;

/// Extract command arguments from params
pub fn extract_arguments(params: &Value) -> Value {
    params
        .get("arguments")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()))
}

/// Extract command name from params
pub fn extract_command_name(params: &Value) -> Option<&str> {
    params.get("name").and_then(|v| v.as_str())
}
