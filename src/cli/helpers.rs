//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cli::args::OutputFormat;
use crate::core::config::Config;
use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::enums::EnumSources;
use crate::schema::session::FormSession;

/// Read a JSON or YAML document (YAML is chosen by `.yaml`/`.yml` extension)
pub fn load_document(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;

    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    if is_yaml {
        serde_yml::from_str(&contents)
            .map_err(|e| miette::miette!("Invalid YAML in {}: {}", path.display(), e))
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| miette::miette!("Invalid JSON in {}: {}", path.display(), e))
    }
}

/// Enum sources from `--sources`, falling back to the configured file
pub fn load_sources(explicit: Option<&PathBuf>, config: &Config) -> Result<EnumSources> {
    match explicit.or(config.enum_sources.as_ref()) {
        Some(path) => EnumSources::load(path),
        None => Ok(EnumSources::new()),
    }
}

/// Parse `PATH=VALUE`; the value is JSON if it parses, otherwise a string
///
/// The path is returned as text so it can be resolved against the form.
pub fn parse_assignment(arg: &str) -> Result<(String, Value)> {
    let (path, raw) = arg
        .split_once('=')
        .ok_or_else(|| miette::miette!("Expected PATH=VALUE, got '{}'", arg))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((path.trim().to_string(), value))
}

/// Parse `SLOT=LABEL` for group instance creation
pub fn parse_group_add(arg: &str) -> Result<(String, String)> {
    let (slot, label) = arg
        .split_once('=')
        .ok_or_else(|| miette::miette!("Expected SLOT=LABEL, got '{}'", arg))?;
    Ok((slot.trim().to_string(), label.trim().to_string()))
}

/// Resolve user-typed path text to the field it names in the session
pub fn resolve_field(session: &FormSession, text: &str) -> Result<FieldPath> {
    session
        .lookup(text)
        .map(|desc| desc.path.clone())
        .ok_or_else(|| miette::miette!("No field at {}", text))
}

/// Serialize `value` in the requested format (auto means pretty JSON)
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serde_yml::to_string(value).into_diagnostic(),
        OutputFormat::Json | OutputFormat::Auto => {
            serde_json::to_string_pretty(value).into_diagnostic()
        }
    }
}

/// Write a document to `output`, or stdout when no file is given
pub fn emit<T: Serialize>(value: &T, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let text = render(value, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", text.trim_end())).into_diagnostic()?;
            tracing::info!("Wrote {}", path.display());
        }
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}

/// Print per-field issues as warnings on stderr
pub fn print_issues(issues: &[FormError], quiet: bool) {
    if quiet {
        return;
    }
    for issue in issues {
        eprintln!("{} {}", style("warning:").yellow().bold(), issue);
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for outline columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
