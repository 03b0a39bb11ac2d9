//! Filter engine: runs parsed rule chains over a mapping of input values.
//!
//! The engine owns its [`FilterRegistry`]; nothing is shared between engine
//! instances. A typical lifecycle is construct, seed with the default filters,
//! register custom filters, then call [`FilterEngine::filter`] as often as
//! needed.
//!
//! # Example
//!
//! ```
//! use filterchain::{rule_map, FilterEngine, MissingFields};
//! use indexmap::IndexMap;
//! use serde_json::{json, Value};
//!
//! let engine = FilterEngine::with_default_filters();
//!
//! let mut inputs: IndexMap<String, Value> = IndexMap::new();
//! inputs.insert("name".to_string(), json!("  ada lovelace "));
//!
//! let rules = rule_map([("name", "trim|capfirst"), ("role", "default:guest")]);
//!
//! let output = engine.filter(&inputs, &rules, MissingFields::Execute).unwrap();
//! assert_eq!(output["name"], json!("Ada lovelace"));
//! assert_eq!(output["role"], json!("guest"));
//! ```
//!
//! Sharing one engine between threads takes an external lock: `filter` only
//! needs `&self`, registration needs `&mut self`, so a `RwLock<FilterEngine>`
//! lets filter calls run concurrently while registrations are exclusive.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::filter_registry::{FilterError, FilterFn, FilterRegistry, FilterSource, FilterTypes};
use crate::filters;
use crate::rule_parser::{parse_rules, FilterCall, RuleSpec};

/// Internal key used by [`FilterEngine::filter_one`].
const SINGLE_VALUE_KEY: &str = "__filterchain_value__";

/// What to do with fields that have rules but no input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFields {
    /// Run the chain from a `null` seed and include the result.
    #[default]
    Execute,
    /// Leave the field out of the output.
    Skip,
}

impl From<bool> for MissingFields {
    fn from(execute_for_missing: bool) -> Self {
        if execute_for_missing {
            MissingFields::Execute
        } else {
            MissingFields::Skip
        }
    }
}

/// Applies rule chains to input mappings using its own filter registry.
#[derive(Clone)]
pub struct FilterEngine {
    registry: FilterRegistry,
    types: FilterTypes,
}

impl FilterEngine {
    /// Create an engine with an empty registry.
    ///
    /// The type catalog already knows the built-in filter types (`Trim`,
    /// `ConvertDate`, ...), so they can be registered under any name.
    pub fn new() -> Self {
        Self {
            registry: FilterRegistry::new(),
            types: filters::builtin_types(),
        }
    }

    /// Create an engine with the default filter set already registered.
    pub fn with_default_filters() -> Self {
        let registry = filters::default_filters()
            .map(|(name, func)| (name.to_string(), func))
            .collect();
        Self {
            registry,
            types: filters::builtin_types(),
        }
    }

    /// Register the built-in filters.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateFilter` on the first built-in name that is already
    /// registered, which is what a second call on the same engine does.
    /// Nothing is registered in that case.
    pub fn register_default_filters(&mut self) -> Result<(), FilterError> {
        if let Some(name) = filters::default_filter_names().find(|name| self.has_filter(name)) {
            return Err(FilterError::DuplicateFilter(name.to_string()));
        }
        for (name, func) in filters::default_filters() {
            self.registry.register(name, func)?;
        }
        debug!(count = filters::DEFAULT_FILTERS.len(), "registered default filters");
        Ok(())
    }

    /// Register a filter.
    ///
    /// `source` may be a function, a factory or a type name known to the
    /// engine's type catalog; factories and type names are instantiated here,
    /// once.
    ///
    /// # Errors
    ///
    /// * `DuplicateFilter` - `name` is already registered
    /// * `UncallableFilter` - `source` did not produce a callable filter
    pub fn register_filter(
        &mut self,
        name: impl Into<String>,
        source: impl Into<FilterSource>,
    ) -> Result<(), FilterError> {
        let name = name.into();
        if self.registry.has_filter(&name) {
            return Err(FilterError::DuplicateFilter(name));
        }

        let func = source.into().resolve(&name, &self.types)?;
        debug!(filter = %name, "registered filter");
        self.registry.register(name, func)
    }

    /// Register a closure as a filter.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F) -> Result<(), FilterError>
    where
        F: Fn(Value, &[String]) -> Result<Value, FilterError> + Send + Sync + 'static,
    {
        self.register_filter(name, FilterSource::function(func))
    }

    /// Make a filter type available to [`FilterSource::Type`] registrations.
    pub fn register_filter_type<C>(&mut self, path: impl Into<String>, constructor: C)
    where
        C: Fn() -> Option<Arc<dyn FilterFn>> + Send + Sync + 'static,
    {
        self.types.insert(path, constructor);
    }

    /// Remove a filter; unknown names are ignored.
    pub fn unregister_filter(&mut self, name: &str) {
        if self.registry.unregister(name) {
            debug!(filter = %name, "unregistered filter");
        }
    }

    /// Names of all registered filters.
    pub fn list_filters(&self) -> HashSet<String> {
        self.registry.names()
    }

    /// Check if a filter is registered under `name`.
    pub fn has_filter(&self, name: &str) -> bool {
        self.registry.has_filter(name)
    }

    /// Filter a mapping of input values.
    ///
    /// Fields without rules are copied unchanged. Fields with rules run their
    /// chain left to right. With [`MissingFields::Execute`], rule fields absent
    /// from `inputs` are computed from `null` and appended after the input
    /// fields, in rule declaration order.
    ///
    /// # Errors
    ///
    /// `UnknownFilter` if a chain names an unregistered filter, or whatever
    /// error a filter itself returns. The registry is never modified.
    pub fn filter(
        &self,
        inputs: &IndexMap<String, Value>,
        rules: &IndexMap<String, RuleSpec>,
        missing: MissingFields,
    ) -> Result<IndexMap<String, Value>, FilterError> {
        let chains = parse_rules(rules);

        let mut output = IndexMap::with_capacity(inputs.len());
        let mut visited = HashSet::new();

        for (field, value) in inputs {
            let value = match chains.get(field) {
                Some(chain) => {
                    visited.insert(field.as_str());
                    self.run_chain(field, chain, value.clone())?
                }
                None => value.clone(),
            };
            output.insert(field.clone(), value);
        }

        if missing == MissingFields::Execute {
            for (field, chain) in &chains {
                if visited.contains(field.as_str()) {
                    continue;
                }
                debug!(field = %field, "computing missing field");
                let value = self.run_chain(field, chain, Value::Null)?;
                output.insert(field.clone(), value);
            }
        }

        Ok(output)
    }

    /// Filter a single value with one rule specification.
    pub fn filter_one(&self, value: Value, spec: impl Into<RuleSpec>) -> Result<Value, FilterError> {
        let mut inputs = IndexMap::with_capacity(1);
        inputs.insert(SINGLE_VALUE_KEY.to_string(), value);

        let mut rules = IndexMap::with_capacity(1);
        rules.insert(SINGLE_VALUE_KEY.to_string(), spec.into());

        let mut output = self.filter(&inputs, &rules, MissingFields::Execute)?;
        Ok(output.swap_remove(SINGLE_VALUE_KEY).unwrap_or(Value::Null))
    }

    fn run_chain(&self, field: &str, chain: &[FilterCall], seed: Value) -> Result<Value, FilterError> {
        chain.iter().try_fold(seed, |value, call| {
            if call.is_blank() {
                return Ok(value);
            }
            trace!(field = %field, filter = %call.name, args = ?call.args, "applying filter");
            self.registry.call(&call.name, value, &call.args)
        })
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.list_filters().into_iter().collect();
        names.sort();
        f.debug_struct("FilterEngine").field("filters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_parser::rule_map;
    use serde_json::json;

    fn inputs(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_no_rules_is_identity() {
        let engine = FilterEngine::with_default_filters();
        let values = inputs(&[("a", json!(" x ")), ("b", json!([1, 2])), ("c", json!(null))]);

        let output = engine.filter(&values, &IndexMap::new(), MissingFields::Execute).unwrap();
        assert_eq!(output, values);
    }

    #[test]
    fn test_chain_runs_left_to_right() {
        let mut engine = FilterEngine::new();
        engine
            .register_fn("append_a", |value: Value, _args: &[String]| {
                Ok(json!(format!("{}a", value.as_str().unwrap_or_default())))
            })
            .unwrap();
        engine
            .register_fn("append_b", |value: Value, _args: &[String]| {
                Ok(json!(format!("{}b", value.as_str().unwrap_or_default())))
            })
            .unwrap();

        assert_eq!(engine.filter_one(json!(">"), "append_a|append_b").unwrap(), json!(">ab"));
        assert_eq!(engine.filter_one(json!(">"), "append_b|append_a").unwrap(), json!(">ba"));
    }

    #[test]
    fn test_blank_filter_name_is_identity_step() {
        let engine = FilterEngine::with_default_filters();

        assert_eq!(engine.filter_one(json!(" x "), "trim||upper").unwrap(), json!("X"));
        assert_eq!(engine.filter_one(json!(" x "), vec!["", "trim"]).unwrap(), json!("x"));
    }

    #[test]
    fn test_missing_fields_policy() {
        let engine = FilterEngine::with_default_filters();
        let rules = rule_map([("k", "default:x")]);

        let output = engine.filter(&IndexMap::new(), &rules, MissingFields::Execute).unwrap();
        assert_eq!(output, inputs(&[("k", json!("x"))]));

        let output = engine.filter(&IndexMap::new(), &rules, MissingFields::Skip).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_present_field_with_skip_policy() {
        let engine = FilterEngine::with_default_filters();
        let rules = rule_map([("k", "trim")]);

        let output = engine
            .filter(&inputs(&[("k", json!("v"))]), &rules, MissingFields::Skip)
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output["k"], json!("v"));
    }

    #[test]
    fn test_input_fields_come_before_missing_fields() {
        let engine = FilterEngine::with_default_filters();
        let rules = rule_map([("late", "default:1"), ("b", "upper"), ("early", "default:2")]);
        let values = inputs(&[("b", json!("x")), ("a", json!("y"))]);

        let output = engine.filter(&values, &rules, MissingFields::Execute).unwrap();
        let keys: Vec<&str> = output.keys().map(String::as_str).collect();

        assert_eq!(&keys[..2], &["b", "a"]);
        assert_eq!(output.len(), 4);
        assert_eq!(output["late"], json!("1"));
        assert_eq!(output["early"], json!("2"));
    }

    #[test]
    fn test_unknown_filter_is_named() {
        let engine = FilterEngine::with_default_filters();
        let err = engine.filter_one(json!("x"), "trim|shout").unwrap_err();

        assert_eq!(err, FilterError::UnknownFilter("shout".to_string()));
        assert!(err.to_string().contains("shout"));
    }

    #[test]
    fn test_unknown_filter_in_unrelated_missing_field_with_skip() {
        let engine = FilterEngine::with_default_filters();
        let rules = rule_map([("absent", "shout")]);

        let output = engine
            .filter(&inputs(&[("a", json!(1))]), &rules, MissingFields::Skip)
            .unwrap();
        assert_eq!(output, inputs(&[("a", json!(1))]));
    }

    #[test]
    fn test_register_duplicate_and_unregister() {
        let mut engine = FilterEngine::with_default_filters();

        let err = engine.register_filter("trim", "Upper").unwrap_err();
        assert_eq!(err, FilterError::DuplicateFilter("trim".to_string()));

        engine.unregister_filter("trim");
        engine.unregister_filter("trim");
        assert!(!engine.list_filters().contains("trim"));

        engine.register_filter("trim", "Upper").unwrap();
        assert_eq!(engine.filter_one(json!(" a "), "trim").unwrap(), json!(" A "));
    }

    #[test]
    fn test_register_default_filters_twice() {
        let mut engine = FilterEngine::new();
        engine.register_default_filters().unwrap();
        assert_eq!(engine.list_filters().len(), filters::DEFAULT_FILTERS.len());

        let err = engine.register_default_filters().unwrap_err();
        assert!(matches!(err, FilterError::DuplicateFilter(_)));
        assert_eq!(engine.list_filters().len(), filters::DEFAULT_FILTERS.len());
    }

    #[test]
    fn test_register_default_filters_is_all_or_nothing() {
        let mut engine = FilterEngine::new();
        engine
            .register_fn("default", |value: Value, _args: &[String]| Ok(value))
            .unwrap();
        let before = engine.list_filters();

        let err = engine.register_default_filters().unwrap_err();
        assert_eq!(err, FilterError::DuplicateFilter("default".to_string()));
        assert_eq!(engine.list_filters(), before);
        assert!(!engine.has_filter("trim"));
    }

    #[test]
    fn test_missing_date_field_passes_through() {
        let engine = FilterEngine::with_default_filters();
        let rules = rule_map([("d", "convert_date:Y-m-d")]);

        let output = engine.filter(&IndexMap::new(), &rules, MissingFields::Execute).unwrap();
        assert_eq!(output["d"], Value::Null);
    }

    #[test]
    fn test_uncallable_sources() {
        let mut engine = FilterEngine::new();

        let err = engine.register_filter("nope", "NoSuchFilter").unwrap_err();
        assert_eq!(err, FilterError::UncallableFilter("NoSuchFilter".to_string()));

        engine.register_filter_type("Broken", || None);
        let err = engine.register_filter("broken", "Broken").unwrap_err();
        assert_eq!(err, FilterError::UncallableFilter("Broken".to_string()));

        let err = engine
            .register_filter("factory", FilterSource::factory(|| None))
            .unwrap_err();
        assert_eq!(err, FilterError::UncallableFilter("factory".to_string()));

        assert!(engine.list_filters().is_empty());
    }

    #[test]
    fn test_factory_runs_once_at_registration() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut engine = FilterEngine::new();
        engine
            .register_filter(
                "shout",
                FilterSource::factory(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let func: Arc<dyn FilterFn> = Arc::new(filters::string::upper);
                    Some(func)
                }),
            )
            .unwrap();

        engine.filter_one(json!("a"), "shout|shout").unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_one_with_null() {
        let engine = FilterEngine::with_default_filters();

        assert_eq!(engine.filter_one(Value::Null, "default:fallback").unwrap(), json!("fallback"));
        assert_eq!(engine.filter_one(Value::Null, "").unwrap(), Value::Null);
        assert_eq!(engine.filter_one(Value::Null, RuleSpec::Empty).unwrap(), Value::Null);
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FilterEngine>();
    }

    #[test]
    fn test_missing_fields_from_bool() {
        assert_eq!(MissingFields::from(true), MissingFields::Execute);
        assert_eq!(MissingFields::from(false), MissingFields::Skip);
        assert_eq!(MissingFields::default(), MissingFields::Execute);
    }
}
