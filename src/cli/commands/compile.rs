//! `jsonform compile` command - Print the form model for a schema

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{emit, load_document, load_sources, print_issues, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::schema::compiler::FieldDescriptor;
use crate::schema::session::FormSession;

#[derive(clap::Args, Debug)]
pub struct CompileArgs {
    /// Schema file (JSON, or YAML by extension)
    pub schema: PathBuf,

    /// Enum sources file mapping names to option lists
    #[arg(long, short = 's')]
    pub sources: Option<PathBuf>,

    /// Fail when any field has an unresolved enum source
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: CompileArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let raw = load_document(&args.schema)?;
    let sources = load_sources(args.sources.as_ref(), &config)?;
    let session = FormSession::compile(&raw, sources, &config)?;

    match global.format.resolve(config.default_format.as_deref()) {
        OutputFormat::Auto => print_outline(session.root()),
        format => emit(session.root(), format, None)?,
    }

    print_issues(session.issues(), global.quiet);
    if args.strict && !session.issues().is_empty() {
        return Err(miette::miette!(
            "{} field(s) could not be compiled",
            session.issues().len()
        ));
    }
    Ok(())
}

fn print_outline(root: &FieldDescriptor) {
    println!("{:<32} {:<10} {}", "PATH", "KIND", "TITLE");
    println!("{}", "-".repeat(70));
    for line in outline(root) {
        println!("{}", line);
    }
}

/// One line per field below the root, indented by depth
fn outline(root: &FieldDescriptor) -> Vec<String> {
    let mut lines = Vec::new();
    for child in &root.children {
        outline_into(child, 0, &mut lines);
    }
    if root.is_group() {
        lines.push(describe(root, 0));
    }
    lines
}

fn outline_into(desc: &FieldDescriptor, depth: usize, lines: &mut Vec<String>) {
    lines.push(describe(desc, depth));
    for child in &desc.children {
        outline_into(child, depth + 1, lines);
    }
}

fn describe(desc: &FieldDescriptor, depth: usize) -> String {
    let path = format!("{}{}", "  ".repeat(depth), desc.path);
    let kind = if desc.is_group() {
        "group".to_string()
    } else if desc.multiselect {
        format!("{}[]", desc.kind)
    } else {
        desc.kind.to_string()
    };

    let mut detail = desc.title.clone();
    if desc.is_group() {
        detail = format!("{} <{}>", detail, desc.group_labels.join(" | "));
    } else if !desc.options.is_empty() {
        let options: Vec<String> = desc.options.iter().map(|v| v.to_string()).collect();
        detail = format!("{} {{{}}}", detail, truncate_str(&options.join(", "), 40));
    }
    if desc.error.is_some() {
        detail = format!("{} {}", detail, style("(unresolved options)").yellow());
    }

    format!("{:<32} {:<10} {}", truncate_str(&path, 32), kind, detail)
}
