//! Built-in filter set.
//!
//! | name | effect |
//! |---|---|
//! | `trim`, `ltrim`, `rtrim` | strip whitespace or the argument characters |
//! | `upper`, `lower`, `capfirst`, `lowerfirst` | case conversion |
//! | `default`, `default_boolean`, `default_array` | fallback for empty values |
//! | `convert_date` | reformat a date string |
//! | `null`, `bool` | emptiness and truthiness coercion |
//! | `to_json`, `to_array`, `to_object` | JSON encoding and decoding |
//!
//! None of these are registered automatically; see
//! [`FilterEngine::register_default_filters`](crate::FilterEngine::register_default_filters).

pub mod date;
pub mod defaults;
pub mod json;
pub mod string;
pub mod value;

use std::sync::Arc;

use serde_json::Value;

use crate::filter_registry::{FilterError, FilterFn, FilterTypes};

pub use value::{is_empty_value, is_truthy, parse_bool};

/// Signature shared by all built-in filters.
pub type BuiltinFilter = fn(Value, &[String]) -> Result<Value, FilterError>;

/// Built-in filters: (registered name, type name, function).
pub const DEFAULT_FILTERS: &[(&str, &str, BuiltinFilter)] = &[
    ("trim", "Trim", string::trim),
    ("ltrim", "LTrim", string::ltrim),
    ("rtrim", "RTrim", string::rtrim),
    ("upper", "Upper", string::upper),
    ("lower", "Lower", string::lower),
    ("capfirst", "CapFirst", string::capfirst),
    ("lowerfirst", "LowerFirst", string::lowerfirst),
    ("default", "Default", defaults::default),
    ("default_boolean", "DefaultBoolean", defaults::default_boolean),
    ("default_array", "DefaultArray", defaults::default_array),
    ("convert_date", "ConvertDate", date::convert_date),
    ("null", "Null", defaults::null),
    ("bool", "Bool", defaults::bool),
    ("to_json", "ToJson", json::to_json),
    ("to_array", "ToArray", json::to_array),
    ("to_object", "ToObject", json::to_object),
];

/// Names of the built-in filters, in table order.
pub fn default_filter_names() -> impl Iterator<Item = &'static str> {
    DEFAULT_FILTERS.iter().map(|(name, _, _)| *name)
}

/// Built-in filters as registrable filter functions.
pub fn default_filters() -> impl Iterator<Item = (&'static str, Arc<dyn FilterFn>)> {
    DEFAULT_FILTERS
        .iter()
        .map(|(name, _, func)| (*name, Arc::new(*func) as Arc<dyn FilterFn>))
}

/// Type catalog holding every built-in filter under its type name.
pub fn builtin_types() -> FilterTypes {
    let mut types = FilterTypes::new();
    for (_, type_name, func) in DEFAULT_FILTERS {
        let func = *func;
        types.insert(*type_name, move || Some(Arc::new(func) as Arc<dyn FilterFn>));
    }
    types
}
