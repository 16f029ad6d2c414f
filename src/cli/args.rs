//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    bind::BindArgs, compile::CompileArgs, completions::CompletionsArgs, fill::FillArgs,
};

#[derive(Parser)]
#[command(name = "jsonform")]
#[command(author, version, about = "JSON Schema form compiler")]
#[command(long_about = "Compile JSON Schemas (with x-enum-source, x-multiselect and x-multiple-group extensions) into form models and bind them to values.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a schema and print the form model
    Compile(CompileArgs),

    /// Bind values to a compiled form without prompting
    Bind(BindArgs),

    /// Fill a form interactively in the terminal
    Fill(FillArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Text outline for form models, JSON for documents
    #[default]
    Auto,
    /// JSON format (for programming)
    Json,
    /// YAML format (full fidelity)
    Yaml,
}

impl OutputFormat {
    /// Resolve `auto` against the configured default
    pub fn resolve(self, configured: Option<&str>) -> Self {
        if self != OutputFormat::Auto {
            return self;
        }
        match configured.map(str::to_ascii_lowercase).as_deref() {
            Some("json") => OutputFormat::Json,
            Some("yaml") | Some("yml") => OutputFormat::Yaml,
            _ => OutputFormat::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_resolution() {
        assert_eq!(OutputFormat::Auto.resolve(Some("YAML")), OutputFormat::Yaml);
        assert_eq!(OutputFormat::Json.resolve(Some("yaml")), OutputFormat::Json);
        assert_eq!(OutputFormat::Auto.resolve(None), OutputFormat::Auto);
    }
}
