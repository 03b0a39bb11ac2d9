//! Value predicates shared by the built-in filters.

use serde_json::Value;

/// Loose emptiness check used by every `default*` filter, `null`, `bool` and
/// `convert_date`.
///
/// Empty values are: `null`, `""`, `"0"`, an empty array, an empty object,
/// `false` and numeric zero.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Truthiness: the negation of [`is_empty_value`].
pub fn is_truthy(value: &Value) -> bool {
    !is_empty_value(value)
}

/// Parse a boolean word (`true/false/1/0/yes/no/on/off`), ignoring case.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// String form of a scalar value; `None` for null, arrays and objects.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
