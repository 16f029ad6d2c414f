//! jsonform: JSON Schema form compiler
//!
//! Compiles JSON Schemas extended with `x-enum-source`, `x-multiselect` and
//! `x-multiple-group` into renderer-agnostic form models, and binds those
//! models to live field values in both directions.

pub mod cli;
pub mod core;
pub mod render;
pub mod schema;
