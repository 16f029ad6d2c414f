//! `jsonform bind` command - Non-interactive round trip through a form
//!
//! Compiles the schema, creates any requested group instances, loads a
//! value document, applies `--set` overrides as raw field input and prints
//! the extracted document. Fields that fail to coerce are reported together.

use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{
    emit, load_document, load_sources, parse_assignment, parse_group_add, print_issues,
    resolve_field,
};
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::error::FieldErrors;
use crate::render::MemoryRenderer;
use crate::schema::binder::FieldWriter;
use crate::schema::session::FormSession;

#[derive(clap::Args, Debug)]
pub struct BindArgs {
    /// Schema file (JSON, or YAML by extension)
    pub schema: PathBuf,

    /// Enum sources file mapping names to option lists
    #[arg(long, short = 's')]
    pub sources: Option<PathBuf>,

    /// Value document to load into the form
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Add a group instance before loading (SLOT=LABEL, repeatable)
    #[arg(long = "add", value_name = "SLOT=LABEL")]
    pub add: Vec<String>,

    /// Set raw field input (PATH=VALUE, repeatable; keys containing '/' cannot be set)
    #[arg(long = "set", value_name = "PATH=VALUE")]
    pub set: Vec<String>,

    /// Skip writing schema defaults before loading values
    #[arg(long)]
    pub no_defaults: bool,

    /// Write the document to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: BindArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let raw = load_document(&args.schema)?;
    let sources = load_sources(args.sources.as_ref(), &config)?;
    let mut session = FormSession::compile(&raw, sources, &config)?;
    let mut renderer = MemoryRenderer::new();

    for arg in &args.add {
        let (slot, label) = parse_group_add(arg)?;
        let slot = resolve_field(&session, &slot)?;
        let inst = session.add_instance(&slot, &label)?;
        tracing::debug!("Created {} at {}", label, inst.fields.path);
    }

    if !args.no_defaults {
        session.apply_defaults(&mut renderer);
    }
    if let Some(ref path) = args.values {
        let doc = load_document(path)?;
        session.load(&doc, &mut renderer)?;
        if !args.no_defaults {
            // Instances created by the load need their defaults too.
            let mut fresh = MemoryRenderer::new();
            session.apply_defaults(&mut fresh);
            for (path, value) in fresh.iter() {
                if renderer.get(path).is_none() {
                    renderer.write_field(path, value.clone());
                }
            }
        }
    }

    for arg in &args.set {
        let (path, value) = parse_assignment(arg)?;
        let path = resolve_field(&session, &path)?;
        renderer.write_field(&path, value);
    }

    print_issues(session.issues(), global.quiet);

    let format = global.format.resolve(config.default_format.as_deref());
    let extraction = session.extract(&renderer);
    emit(&extraction.value, format, args.output.as_deref())?;

    if extraction.is_clean() {
        Ok(())
    } else {
        Err(FieldErrors::new(extraction.errors).into())
    }
}
