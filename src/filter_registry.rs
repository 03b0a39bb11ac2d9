//! Filter registry for registering and calling named filter functions.
//!
//! A filter turns one value into another, driven by the string arguments that
//! follow its name in a rule token (`trim:#,$`). Filters are stored behind a
//! uniform [`FilterFn`] trait object; anything callable-like is resolved into
//! that shape when it is registered, see [`FilterSource`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Error type for filter registration and execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A rule chain names a filter that is not registered.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// A filter with this name is already registered.
    #[error("filter already registered: {0}")]
    DuplicateFilter(String),

    /// The registered source could not be turned into a callable filter.
    #[error("filter is not callable: {0}")]
    UncallableFilter(String),

    /// The filter was invoked with arguments it cannot work with.
    #[error("invalid arguments for filter '{filter}': {reason}")]
    InvalidArguments { filter: String, reason: String },

    /// The filter could not transform its input value.
    #[error("filter '{filter}' failed: {reason}")]
    FilterFailed { filter: String, reason: String },
}

impl FilterError {
    pub(crate) fn invalid_args(filter: &str, reason: impl Into<String>) -> Self {
        FilterError::InvalidArguments {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn failed(filter: &str, reason: impl Into<String>) -> Self {
        FilterError::FilterFailed {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }
}

/// Trait for filter functions
///
/// A filter receives the current value of a field and the argument list of
/// its rule token, and returns the next value in the chain.
pub trait FilterFn: Send + Sync {
    /// Apply the filter to `value`.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - Filtered value, handed to the next filter in the chain
    /// * `Err(FilterError)` - The filter could not be applied
    fn apply(&self, value: Value, args: &[String]) -> Result<Value, FilterError>;
}

/// Simple function-based implementation of FilterFn
impl<F> FilterFn for F
where
    F: Fn(Value, &[String]) -> Result<Value, FilterError> + Send + Sync,
{
    fn apply(&self, value: Value, args: &[String]) -> Result<Value, FilterError> {
        self(value, args)
    }
}

/// Constructor producing a filter instance.
///
/// Returning `None` means the constructed object is not usable as a filter.
pub type FilterConstructor = Arc<dyn Fn() -> Option<Arc<dyn FilterFn>> + Send + Sync>;

/// Something that can be registered as a filter.
#[derive(Clone)]
pub enum FilterSource {
    /// A ready-to-call filter function.
    Function(Arc<dyn FilterFn>),

    /// A constructor that is instantiated once, at registration time.
    Factory(FilterConstructor),

    /// A filter type name, resolved through a [`FilterTypes`] catalog.
    Type(String),
}

impl fmt::Debug for FilterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSource::Function(_) => write!(f, "Function(..)"),
            FilterSource::Factory(_) => write!(f, "Factory(..)"),
            FilterSource::Type(path) => write!(f, "Type({:?})", path),
        }
    }
}

impl FilterSource {
    /// Wrap a closure or function as a filter source.
    pub fn function<F>(func: F) -> Self
    where
        F: Fn(Value, &[String]) -> Result<Value, FilterError> + Send + Sync + 'static,
    {
        FilterSource::Function(Arc::new(func))
    }

    /// Wrap a constructor as a filter source.
    pub fn factory<C>(constructor: C) -> Self
    where
        C: Fn() -> Option<Arc<dyn FilterFn>> + Send + Sync + 'static,
    {
        FilterSource::Factory(Arc::new(constructor))
    }

    /// Resolve this source into a callable filter.
    ///
    /// # Errors
    ///
    /// Returns `UncallableFilter` when a factory yields nothing or a type name
    /// is not present in `types`.
    pub fn resolve(self, name: &str, types: &FilterTypes) -> Result<Arc<dyn FilterFn>, FilterError> {
        match self {
            FilterSource::Function(func) => Ok(func),
            FilterSource::Factory(constructor) => {
                constructor().ok_or_else(|| FilterError::UncallableFilter(name.to_string()))
            }
            FilterSource::Type(path) => types
                .instantiate(&path)
                .ok_or(FilterError::UncallableFilter(path)),
        }
    }
}

impl From<Arc<dyn FilterFn>> for FilterSource {
    fn from(func: Arc<dyn FilterFn>) -> Self {
        FilterSource::Function(func)
    }
}

impl From<&str> for FilterSource {
    fn from(path: &str) -> Self {
        FilterSource::Type(path.to_string())
    }
}

impl From<String> for FilterSource {
    fn from(path: String) -> Self {
        FilterSource::Type(path)
    }
}

/// Catalog of named filter types that can be instantiated on registration.
#[derive(Clone, Default)]
pub struct FilterTypes {
    constructors: HashMap<String, FilterConstructor>,
}

impl FilterTypes {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constructor under `path`, replacing any previous one.
    pub fn insert<C>(&mut self, path: impl Into<String>, constructor: C)
    where
        C: Fn() -> Option<Arc<dyn FilterFn>> + Send + Sync + 'static,
    {
        self.constructors.insert(path.into(), Arc::new(constructor));
    }

    /// Instantiate the filter type registered under `path`.
    pub fn instantiate(&self, path: &str) -> Option<Arc<dyn FilterFn>> {
        self.constructors.get(path).and_then(|constructor| constructor())
    }

    /// Check if a type path is known
    pub fn contains(&self, path: &str) -> bool {
        self.constructors.contains_key(path)
    }
}

/// Registry for storing and calling filter functions
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn FilterFn>>,
}

impl FilterRegistry {
    /// Create a new empty filter registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter function
    ///
    /// # Errors
    ///
    /// Returns `DuplicateFilter` if `name` is already taken; the registry is
    /// left untouched in that case.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        func: Arc<dyn FilterFn>,
    ) -> Result<(), FilterError> {
        let name = name.into();
        if self.filters.contains_key(&name) {
            return Err(FilterError::DuplicateFilter(name));
        }
        self.filters.insert(name, func);
        Ok(())
    }

    /// Remove a filter. Removing an unknown name does nothing.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }

    /// Look up a filter by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FilterFn>> {
        self.filters.get(name)
    }

    /// Call a registered filter
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the registered filter
    /// * `value` - Current value
    /// * `args` - Arguments from the rule token
    pub fn call(&self, name: &str, value: Value, args: &[String]) -> Result<Value, FilterError> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;

        filter.apply(value, args)
    }

    /// Check if a filter is registered
    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Names of all registered filters
    pub fn names(&self) -> HashSet<String> {
        self.filters.keys().cloned().collect()
    }

    /// Number of registered filters
    pub fn count(&self) -> usize {
        self.filters.len()
    }
}

impl FromIterator<(String, Arc<dyn FilterFn>)> for FilterRegistry {
    fn from_iter<I: IntoIterator<Item = (String, Arc<dyn FilterFn>)>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper() -> Arc<dyn FilterFn> {
        Arc::new(
            |value: Value, _args: &[String]| -> Result<Value, FilterError> {
                match value {
                    Value::String(s) => Ok(Value::String(s.to_uppercase())),
                    other => Ok(other),
                }
            },
        )
    }

    #[test]
    fn test_register_and_call_filter() {
        let mut registry = FilterRegistry::new();
        registry.register("upper", upper()).unwrap();

        let result = registry
            .call("upper", Value::String("hello".to_string()), &[])
            .unwrap();
        assert_eq!(result, Value::String("HELLO".to_string()));
    }

    #[test]
    fn test_filter_receives_args() {
        let mut registry = FilterRegistry::new();
        registry
            .register(
                "join",
                Arc::new(
                    |_value: Value, args: &[String]| -> Result<Value, FilterError> {
                        Ok(Value::String(args.join("+")))
                    },
                ) as Arc<dyn FilterFn>,
            )
            .unwrap();

        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            registry.call("join", Value::Null, &args).unwrap(),
            Value::String("a+b".to_string())
        );
    }

    #[test]
    fn test_get_returns_callable_filter() {
        let mut registry = FilterRegistry::new();
        registry.register("upper", upper()).unwrap();

        let filter = registry.get("upper").unwrap();
        assert_eq!(
            filter.apply(Value::String("abc".to_string()), &[]).unwrap(),
            Value::String("ABC".to_string())
        );
        assert!(registry.get("lower").is_none());
    }

    #[test]
    fn test_filter_not_found() {
        let registry = FilterRegistry::new();
        let result = registry.call("nonexistent", Value::Null, &[]);

        assert_eq!(result, Err(FilterError::UnknownFilter("nonexistent".to_string())));
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let mut registry = FilterRegistry::new();
        registry.register("upper", upper()).unwrap();

        let identity: Arc<dyn FilterFn> =
            Arc::new(|value: Value, _args: &[String]| -> Result<Value, FilterError> { Ok(value) });
        let err = registry.register("upper", identity).unwrap_err();
        assert_eq!(err, FilterError::DuplicateFilter("upper".to_string()));

        let result = registry.call("upper", Value::String("x".to_string()), &[]).unwrap();
        assert_eq!(result, Value::String("X".to_string()));
    }

    #[test]
    fn test_unregister_is_silent_for_unknown_names() {
        let mut registry = FilterRegistry::new();
        registry.register("upper", upper()).unwrap();

        assert!(!registry.unregister("missing"));
        assert!(registry.unregister("upper"));
        assert!(!registry.has_filter("upper"));
        assert!(registry.get("upper").is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_resolve_sources() {
        let mut types = FilterTypes::new();
        types.insert("Upper", || Some(upper()));
        types.insert("Broken", || None);

        assert!(FilterSource::Type("Upper".to_string()).resolve("u", &types).is_ok());
        assert_eq!(
            FilterSource::Type("Broken".to_string()).resolve("b", &types).err(),
            Some(FilterError::UncallableFilter("Broken".to_string()))
        );
        assert_eq!(
            FilterSource::from("Missing").resolve("m", &types).err(),
            Some(FilterError::UncallableFilter("Missing".to_string()))
        );
        assert_eq!(
            FilterSource::factory(|| None).resolve("f", &types).err(),
            Some(FilterError::UncallableFilter("f".to_string()))
        );
        assert!(FilterSource::factory(|| Some(upper())).resolve("f", &types).is_ok());
    }
}
