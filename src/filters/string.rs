//! String filters: trimming and case conversion.
//!
//! Numbers and booleans are converted to their string form first. `null`
//! passes through untouched so that chains over missing fields stay `null`;
//! arrays and objects are rejected.

use serde_json::Value;

use super::value::scalar_text;
use crate::filter_registry::FilterError;

#[derive(Clone, Copy)]
enum Side {
    Both,
    Left,
    Right,
}

fn map_text(filter: &str, value: Value, f: impl FnOnce(&str) -> String) -> Result<Value, FilterError> {
    if value.is_null() {
        return Ok(value);
    }
    let text = scalar_text(&value)
        .ok_or_else(|| FilterError::failed(filter, "expected a string or scalar value"))?;
    Ok(Value::String(f(&text)))
}

fn strip(filter: &str, value: Value, args: &[String], side: Side) -> Result<Value, FilterError> {
    let charset: Vec<char> = args.concat().chars().collect();

    map_text(filter, value, |text| {
        let stripped = if charset.is_empty() {
            match side {
                Side::Both => text.trim(),
                Side::Left => text.trim_start(),
                Side::Right => text.trim_end(),
            }
        } else {
            let pattern = |c: char| charset.contains(&c);
            match side {
                Side::Both => text.trim_matches(pattern),
                Side::Left => text.trim_start_matches(pattern),
                Side::Right => text.trim_end_matches(pattern),
            }
        };
        stripped.to_string()
    })
}

/// Strip whitespace, or the characters given as arguments, from both ends.
pub fn trim(value: Value, args: &[String]) -> Result<Value, FilterError> {
    strip("trim", value, args, Side::Both)
}

/// Like [`trim`], left end only.
pub fn ltrim(value: Value, args: &[String]) -> Result<Value, FilterError> {
    strip("ltrim", value, args, Side::Left)
}

/// Like [`trim`], right end only.
pub fn rtrim(value: Value, args: &[String]) -> Result<Value, FilterError> {
    strip("rtrim", value, args, Side::Right)
}

pub fn upper(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    map_text("upper", value, str::to_uppercase)
}

pub fn lower(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    map_text("lower", value, str::to_lowercase)
}

/// Uppercase the first character, leave the rest alone.
pub fn capfirst(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    map_text("capfirst", value, |text| {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}

/// Lowercase the first character, leave the rest alone.
pub fn lowerfirst(value: Value, _args: &[String]) -> Result<Value, FilterError> {
    map_text("lowerfirst", value, |text| {
        let mut chars = text.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    })
}
