//! filterchain CLI - apply YAML filter rule sets to JSON documents
//!
//! Reads a JSON object, runs it through the rules of a rule set file with the
//! default filters registered, and prints the filtered object.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filterchain::{filters, FilterEngine, MissingFields, RuleSet};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filterchain")]
#[command(version, about = "Apply declarative filter rule chains to JSON values", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a JSON object with a YAML rule set
    Apply {
        /// Path to the rule set YAML file
        #[arg(short, long)]
        rules: PathBuf,

        /// JSON input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Do not compute rule fields that are missing from the input
        #[arg(short, long)]
        skip_missing: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the built-in filters
    List,

    /// Check that a rule set only references built-in filters
    Check {
        /// Path to the rule set YAML file
        #[arg(short, long)]
        rules: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply {
            rules,
            input,
            skip_missing,
            pretty,
        } => apply(&rules, input.as_deref(), skip_missing, pretty),
        Commands::List => {
            list_filters();
            Ok(())
        }
        Commands::Check { rules } => check(&rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Apply a rule set to a JSON object and print the result
fn apply(rules_path: &Path, input: Option<&Path>, skip_missing: bool, pretty: bool) -> Result<()> {
    let rule_set = RuleSet::load_from_file(rules_path)?;
    info!(
        rules = %rules_path.display(),
        fields = rule_set.rules.len(),
        "loaded rule set"
    );

    let raw = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read input from stdin")?;
            buf
        }
    };

    let inputs: IndexMap<String, Value> =
        serde_json::from_str(&raw).context("input must be a JSON object")?;
    debug!(fields = inputs.len(), "parsed input");

    let missing = if skip_missing {
        MissingFields::Skip
    } else {
        rule_set.missing_fields()
    };

    let engine = FilterEngine::with_default_filters();
    let output = engine.filter(&inputs, &rule_set.rules, missing)?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);
    Ok(())
}

/// Print the built-in filter names
fn list_filters() {
    let mut names: Vec<&str> = filters::default_filter_names().collect();
    names.sort_unstable();
    for name in names {
        println!("{}", name);
    }
}

/// Report filters referenced by a rule set that are not built in
fn check(rules_path: &Path) -> Result<()> {
    let rule_set = RuleSet::load_from_file(rules_path)?;
    let engine = FilterEngine::with_default_filters();

    let unknown = rule_set.unknown_filters(&engine);
    if !unknown.is_empty() {
        bail!("unknown filters in {}: {}", rules_path.display(), unknown.join(", "));
    }

    println!(
        "✓ {} fields, {} distinct filters",
        rule_set.rules.len(),
        rule_set.filter_names().len()
    );
    Ok(())
}
