//! # Filterchain: Declarative Value Filtering
//!
//! Filterchain cleans a mapping of named input values (form fields, decoded
//! request bodies, CSV rows) with declarative per-field rule strings instead of
//! hand-written normalization code.
//!
//! ## Features
//!
//! - **Rule mini-language**: `"trim|default:n/a|upper"`, arguments split CSV-style
//! - **Filter registry**: register closures, factories or named filter types per engine
//! - **Missing-field policy**: compute defaults for fields absent from the input
//! - **Built-in filters**: trimming, case conversion, defaults, date conversion, JSON
//! - **YAML rule sets**: load rules and policy from a config file
//!
//! ## Example
//!
//! ```
//! use filterchain::{rule_map, FilterEngine, MissingFields};
//! use indexmap::IndexMap;
//! use serde_json::json;
//!
//! let engine = FilterEngine::with_default_filters();
//!
//! let inputs: IndexMap<String, serde_json::Value> = [
//!     ("email".to_string(), json!("  Ada@Example.COM ")),
//!     ("birthday".to_string(), json!("10.12.1815")),
//! ]
//! .into_iter()
//! .collect();
//!
//! let rules = rule_map([
//!     ("email", "trim|lower"),
//!     ("birthday", "convert_date:d.m.Y,Y-m-d"),
//!     ("newsletter", "default_boolean:no"),
//! ]);
//!
//! let output = engine.filter(&inputs, &rules, MissingFields::Execute).unwrap();
//! assert_eq!(output["email"], json!("ada@example.com"));
//! assert_eq!(output["birthday"], json!("1815-12-10"));
//! assert_eq!(output["newsletter"], json!(false));
//! ```

// Core modules
pub mod rule_parser;
pub mod filter_registry;
pub mod engine;
pub mod filters;

// Rule set configuration
pub mod config;

// Re-export key types
pub use rule_parser::{parse_chain, parse_rules, parse_token, rule_map, FilterCall, RuleChain, RuleSpec};
pub use filter_registry::{FilterError, FilterFn, FilterRegistry, FilterSource, FilterTypes};
pub use engine::{FilterEngine, MissingFields};
pub use filters::is_empty_value;
pub use config::{ConfigError, RuleSet};
