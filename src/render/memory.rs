//! In-memory field store

use indexmap::IndexMap;
use serde_json::Value;

use crate::core::path::FieldPath;
use crate::schema::binder::{FieldReader, FieldWriter};

/// Path-keyed field values, kept in write order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRenderer {
    fields: IndexMap<FieldPath, Value>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by its `/`-separated path
    pub fn set(&mut self, path: &str, value: Value) {
        let path: FieldPath = match path.parse() {
            Ok(path) => path,
            Err(never) => match never {},
        };
        self.fields.insert(path, value);
    }

    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.fields.get(path)
    }

    /// Drop a field and everything stored beneath it
    pub fn clear_under(&mut self, prefix: &FieldPath) {
        self.fields.retain(|path, _| !path.starts_with(prefix));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &Value)> {
        self.fields.iter()
    }
}

impl FieldReader for MemoryRenderer {
    fn read_field(&self, path: &FieldPath) -> Option<Value> {
        self.fields.get(path).cloned()
    }
}

impl FieldWriter for MemoryRenderer {
    fn write_field(&mut self, path: &FieldPath, value: Value) {
        self.fields.insert(path.clone(), value);
    }
}
