//! Core module - fundamental types and utilities

pub mod config;
pub mod error;
pub mod path;

pub use config::Config;
pub use error::{FieldErrors, FormError};
pub use path::{FieldPath, PathSegment};
