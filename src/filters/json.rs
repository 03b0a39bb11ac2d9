//! JSON encoding and decoding filters.

use serde_json::{Map, Value};

use crate::filter_registry::FilterError;

/// Decode JSON strings; other values are taken as they are.
///
/// A blank string decodes to `null`.
fn decode(filter: &str, value: Value) -> Result<Value, FilterError> {
    match value {
        Value::String(text) if text.trim().is_empty() => Ok(Value::Null),
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| FilterError::failed(filter, format!("invalid JSON: {}", e))),
        other => Ok(other),
    }
}

/// Serialize the value to a JSON string.
pub fn to_json(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    serde_json::to_string(&value)
        .map(Value::String)
        .map_err(|e| FilterError::failed("to_json", e.to_string()))
}

/// Decode into a container: arrays and objects are kept, `null` becomes an
/// empty array and any other scalar is wrapped in a one-element array.
pub fn to_array(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    Ok(match decode("to_array", value)? {
        Value::Null => Value::Array(Vec::new()),
        container @ (Value::Array(_) | Value::Object(_)) => container,
        scalar => Value::Array(vec![scalar]),
    })
}

/// Decode into a mapping: array elements are keyed by their index, `null`
/// becomes an empty object and a scalar is stored under `"scalar"`.
pub fn to_object(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    Ok(match decode("to_object", value)? {
        Value::Null => Value::Object(Map::new()),
        Value::Object(map) => Value::Object(map),
        Value::Array(items) => Value::Object(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        scalar => {
            let mut map = Map::new();
            map.insert("scalar".to_string(), scalar);
            Value::Object(map)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json() {
        assert_eq!(to_json(json!({"a": 1}), &[]).unwrap(), json!(r#"{"a":1}"#));
        assert_eq!(to_json(json!("x"), &[]).unwrap(), json!(r#""x""#));
        assert_eq!(to_json(json!(null), &[]).unwrap(), json!("null"));
    }

    #[test]
    fn test_to_array_round_trip() {
        let original = json!({"name": "Alice", "tags": ["a", "b"], "age": 30});

        let encoded = to_json(original.clone(), &[]).unwrap();
        assert_eq!(to_array(encoded, &[]).unwrap(), original);
    }

    #[test]
    fn test_to_array_casts() {
        assert_eq!(to_array(json!(null), &[]).unwrap(), json!([]));
        assert_eq!(to_array(json!(""), &[]).unwrap(), json!([]));
        assert_eq!(to_array(json!("[1,2]"), &[]).unwrap(), json!([1, 2]));
        assert_eq!(to_array(json!("5"), &[]).unwrap(), json!([5]));
        assert_eq!(to_array(json!(true), &[]).unwrap(), json!([true]));
    }

    #[test]
    fn test_to_object_casts() {
        assert_eq!(to_object(json!(r#"{"a":{"b":1}}"#), &[]).unwrap(), json!({"a": {"b": 1}}));
        assert_eq!(to_object(json!(r#"["x","y"]"#), &[]).unwrap(), json!({"0": "x", "1": "y"}));
        assert_eq!(to_object(json!(null), &[]).unwrap(), json!({}));
        assert_eq!(to_object(json!(7), &[]).unwrap(), json!({"scalar": 7}));
    }

    #[test]
    fn test_invalid_json_fails() {
        let err = to_array(json!("{not json"), &[]).unwrap_err();
        assert!(matches!(err, FilterError::FilterFailed { ref filter, .. } if filter == "to_array"));
    }
}
