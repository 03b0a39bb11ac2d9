//! Rule set configuration loader.
//!
//! Loads a named set of field rules from YAML:
//!
//! ```yaml
//! execute_for_missing: true
//! rules:
//!   name: "trim|capfirst"
//!   tags: ["trim", "default_array:misc"]
//!   birthday: "null|convert_date:d.m.Y,Y-m-d"
//!   note: "null"
//! ```
//!
//! A bare YAML `null` (or `~`) is no rule at all and the field passes through.
//! Quote it (`"null"`) to run the built-in `null` filter.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::engine::{FilterEngine, MissingFields};
use crate::filter_registry::FilterError;
use crate::rule_parser::{parse_rules, RuleSpec};

/// Error type for rule set loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rule YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn default_execute_for_missing() -> bool {
    true
}

/// Field rules plus the missing-field policy they are applied with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Compute rule fields that are absent from the input
    #[serde(default = "default_execute_for_missing")]
    pub execute_for_missing: bool,

    /// Rule specification per field, in declaration order
    #[serde(default)]
    pub rules: IndexMap<String, RuleSpec>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            execute_for_missing: default_execute_for_missing(),
            rules: IndexMap::new(),
        }
    }
}

impl RuleSet {
    /// Load a rule set from a YAML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid rule set
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a rule set from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Build a rule set from an existing rule mapping.
    pub fn from_rules(rules: IndexMap<String, RuleSpec>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn missing_fields(&self) -> MissingFields {
        MissingFields::from(self.execute_for_missing)
    }

    /// Apply the rules to `inputs` with this rule set's missing-field policy.
    pub fn apply(
        &self,
        engine: &FilterEngine,
        inputs: &IndexMap<String, Value>,
    ) -> Result<IndexMap<String, Value>, FilterError> {
        engine.filter(inputs, &self.rules, self.missing_fields())
    }

    /// Every non-blank filter name referenced by the rules.
    pub fn filter_names(&self) -> BTreeSet<String> {
        parse_rules(&self.rules)
            .into_values()
            .flatten()
            .filter(|call| !call.is_blank())
            .map(|call| call.name)
            .collect()
    }

    /// Referenced filter names that `engine` does not know.
    pub fn unknown_filters(&self, engine: &FilterEngine) -> Vec<String> {
        self.filter_names()
            .into_iter()
            .filter(|name| !engine.has_filter(name))
            .collect()
    }
}
