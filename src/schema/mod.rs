//! Schema system - normalization, compilation, groups and value binding

pub mod binder;
pub mod compiler;
pub mod enums;
pub mod groups;
pub mod node;
pub mod session;

pub use binder::{extract, populate, Extraction, FieldReader, FieldWriter};
pub use compiler::{Compiled, FieldDescriptor, NodeCompiler};
pub use enums::EnumSources;
pub use groups::{GroupInstance, GroupManager};
pub use node::{normalize, Kind, Normalizer, SchemaNode};
pub use session::FormSession;
