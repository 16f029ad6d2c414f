//! Renderer collaborators
//!
//! The form core only needs `read_field`/`write_field`; these are the two
//! renderers shipped with the CLI.

pub mod memory;
pub mod terminal;

pub use memory::MemoryRenderer;
pub use terminal::TerminalRenderer;
