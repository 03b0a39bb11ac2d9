//! Default-value and boolean filters.

use serde_json::Value;

use super::value::{is_empty_value, is_truthy, parse_bool};
use crate::filter_registry::FilterError;

/// Replace an empty value with the first argument, or `""`.
pub fn default(value: Value, args: &[String]) -> Result<Value, FilterError> {
    if !is_empty_value(&value) {
        return Ok(value);
    }
    Ok(Value::String(args.first().cloned().unwrap_or_default()))
}

/// Replace an empty value with the boolean parsed from the first argument.
///
/// Unrecognized words and a missing argument both yield `false`.
pub fn default_boolean(value: Value, args: &[String]) -> Result<Value, FilterError> {
    if !is_empty_value(&value) {
        return Ok(value);
    }
    let flag = args
        .first()
        .and_then(|arg| parse_bool(arg))
        .unwrap_or(false);
    Ok(Value::Bool(flag))
}

/// Replace an empty value with the arguments as an array.
pub fn default_array(value: Value, args: &[String]) -> Result<Value, FilterError> {
    if !is_empty_value(&value) {
        return Ok(value);
    }
    Ok(Value::Array(args.iter().cloned().map(Value::String).collect()))
}

/// Collapse empty values to `null`.
pub fn null(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    if is_empty_value(&value) {
        Ok(Value::Null)
    } else {
        Ok(value)
    }
}

pub fn bool(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    Ok(Value::Bool(is_truthy(&value)))
}
