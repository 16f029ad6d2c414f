//! CLI command implementations

pub mod bind;
pub mod compile;
pub mod completions;
pub mod fill;
