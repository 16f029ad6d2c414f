//! `jsonform fill` command - Fill a form interactively

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{emit, load_document, load_sources, print_issues};
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::error::FieldErrors;
use crate::render::{MemoryRenderer, TerminalRenderer};
use crate::schema::session::FormSession;

#[derive(clap::Args, Debug)]
pub struct FillArgs {
    /// Schema file (JSON, or YAML by extension)
    pub schema: PathBuf,

    /// Enum sources file mapping names to option lists
    #[arg(long, short = 's')]
    pub sources: Option<PathBuf>,

    /// Existing document to edit
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Write the document to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: FillArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let raw = load_document(&args.schema)?;
    let sources = load_sources(args.sources.as_ref(), &config)?;
    let mut session = FormSession::compile(&raw, sources, &config)?;
    print_issues(session.issues(), global.quiet);

    let mut values = MemoryRenderer::new();
    session.apply_defaults(&mut values);
    if let Some(ref path) = args.values {
        let doc = load_document(path)?;
        session.load(&doc, &mut values)?;
    }

    let mut renderer = TerminalRenderer::with_values(values);
    renderer.run(&mut session)?;

    let extraction = session.extract(&renderer);
    let format = global.format.resolve(config.default_format.as_deref());
    emit(&extraction.value, format, args.output.as_deref())?;

    if let Some(ref path) = args.output {
        if !global.quiet {
            eprintln!("{} Saved {}", style("✓").green(), path.display());
        }
    }

    if extraction.is_clean() {
        Ok(())
    } else {
        Err(FieldErrors::new(extraction.errors).into())
    }
}
