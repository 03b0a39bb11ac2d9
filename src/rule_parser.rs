//! Rule specification parser.
//!
//! A rule specification describes an ordered filter chain for one field:
//!
//! - `"trim|lower"` - pipe-separated filter tokens
//! - `["trim", "default:n/a"]` - an already split list of tokens
//!
//! A token is `name` or `name:arg1,arg2,...`. Only the first `:` separates the
//! name from its arguments; the argument string is split CSV-style, so a
//! quoted field may hold a literal comma (`trim:","`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Unparsed rule specification for a single field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Pipe-separated filter tokens
    Text(String),
    /// Pre-split filter tokens, one per element
    List(Vec<String>),
    /// No rule: the field passes through unchanged
    #[default]
    Empty,
}

impl From<&str> for RuleSpec {
    fn from(spec: &str) -> Self {
        RuleSpec::Text(spec.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(spec: String) -> Self {
        RuleSpec::Text(spec)
    }
}

impl From<Vec<String>> for RuleSpec {
    fn from(tokens: Vec<String>) -> Self {
        RuleSpec::List(tokens)
    }
}

impl From<Vec<&str>> for RuleSpec {
    fn from(tokens: Vec<&str>) -> Self {
        RuleSpec::List(tokens.into_iter().map(String::from).collect())
    }
}

impl<T: Into<RuleSpec>> From<Option<T>> for RuleSpec {
    fn from(spec: Option<T>) -> Self {
        spec.map(Into::into).unwrap_or_default()
    }
}

/// One filter invocation inside a rule chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCall {
    /// Registered filter name; blank names are identity steps
    pub name: String,
    /// Arguments in declaration order
    #[serde(default)]
    pub args: Vec<String>,
}

impl FilterCall {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// True if this step does nothing
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Ordered filter chain; filters run left to right.
pub type RuleChain = Vec<FilterCall>;

/// Build a rule mapping from `(field, spec)` pairs.
///
/// ```
/// use filterchain::{rule_map, RuleSpec};
///
/// let rules = rule_map([("email", "trim|lower"), ("age", "default:0")]);
/// assert_eq!(rules["email"], RuleSpec::from("trim|lower"));
/// ```
pub fn rule_map<K, S>(pairs: impl IntoIterator<Item = (K, S)>) -> IndexMap<String, RuleSpec>
where
    K: Into<String>,
    S: Into<RuleSpec>,
{
    pairs
        .into_iter()
        .map(|(field, spec)| (field.into(), spec.into()))
        .collect()
}

/// Parse every field's rule specification, keeping declaration order.
pub fn parse_rules(rules: &IndexMap<String, RuleSpec>) -> IndexMap<String, RuleChain> {
    rules
        .iter()
        .map(|(field, spec)| (field.clone(), parse_chain(spec)))
        .collect()
}

/// Parse one rule specification into its filter chain.
pub fn parse_chain(spec: &RuleSpec) -> RuleChain {
    match spec {
        RuleSpec::Text(text) if text.is_empty() => Vec::new(),
        RuleSpec::Text(text) => text.split('|').map(parse_token).collect(),
        RuleSpec::List(tokens) => tokens.iter().map(|t| parse_token(t)).collect(),
        RuleSpec::Empty => Vec::new(),
    }
}

/// Parse a single `name[:args]` token.
pub fn parse_token(token: &str) -> FilterCall {
    match token.split_once(':') {
        Some((name, args)) => FilterCall::new(name.trim(), parse_args(args)),
        None => FilterCall::new(token.trim(), Vec::new()),
    }
}

/// Split an argument string with CSV quoting rules.
///
/// Malformed input never fails: the raw string becomes the single argument.
/// The same goes for input spanning several CSV records (a bare newline).
fn parse_args(args: &str) -> Vec<String> {
    if args.is_empty() {
        return Vec::new();
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(args.as_bytes());

    let mut record = csv::StringRecord::new();
    let mut rest = csv::StringRecord::new();
    match (reader.read_record(&mut record), reader.read_record(&mut rest)) {
        (Ok(true), Ok(false)) => record.iter().map(String::from).collect(),
        _ => vec![args.to_string()],
    }
}
