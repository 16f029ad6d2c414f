//! Enum option resolution
//!
//! Literal `enum` values win; otherwise `x-enum-source` names a list in the
//! caller-supplied [`EnumSources`]. Fetching those lists is the caller's job.

use indexmap::IndexMap;
use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::node::SchemaNode;

/// Named, ordered option lists available at compile time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumSources {
    lists: IndexMap<String, Vec<Value>>,
}

impl EnumSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named list
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<Value>) {
        self.lists.insert(key.into(), values);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.insert(key, values);
        self
    }

    pub fn get(&self, key: &str) -> Option<&[Value]> {
        self.lists.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Build from a JSON object of name → array
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Load a YAML or JSON file mapping names to lists
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        let sources: EnumSources = serde_yml::from_str(&contents)
            .map_err(|e| miette::miette!("Invalid enum sources file {}: {}", path.display(), e))?;
        tracing::debug!("Loaded {} enum sources from {}", sources.len(), path.display());
        Ok(sources)
    }
}

/// Resolve the option list for `node`, compiled at `path`
pub fn resolve(
    node: &SchemaNode,
    path: &FieldPath,
    sources: &EnumSources,
) -> Result<Vec<Value>, FormError> {
    if !node.enum_values.is_empty() {
        return Ok(node.enum_values.clone());
    }

    match &node.enum_source_key {
        Some(key) => sources
            .get(key)
            .map(<[Value]>::to_vec)
            .ok_or_else(|| FormError::UnresolvedEnumSource {
                path: path.clone(),
                key: key.clone(),
            }),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::node::Kind;
    use serde_json::json;

    fn sourced(key: &str) -> SchemaNode {
        let mut node = SchemaNode::new(Kind::String);
        node.enum_source_key = Some(key.to_string());
        node
    }

    #[test]
    fn test_literal_takes_precedence() {
        let mut node = sourced("colors");
        node.enum_values = vec![json!("b"), json!("a")];
        let sources = EnumSources::new().with("colors", vec![json!("red")]);

        let values = resolve(&node, &FieldPath::root(), &sources).unwrap();
        assert_eq!(values, vec![json!("b"), json!("a")]);
    }

    #[test]
    fn test_external_source_order_preserved() {
        let sources = EnumSources::new().with(
            "colors",
            vec![json!("red"), json!("green"), json!("blue")],
        );
        let values = resolve(&sourced("colors"), &FieldPath::root(), &sources).unwrap();
        assert_eq!(values, vec![json!("red"), json!("green"), json!("blue")]);
    }

    #[test]
    fn test_missing_source() {
        let path: FieldPath = "favorite".parse().unwrap();
        let err = resolve(&sourced("colors"), &path, &EnumSources::new()).unwrap_err();
        assert_eq!(
            err,
            FormError::UnresolvedEnumSource {
                path,
                key: "colors".to_string()
            }
        );
    }

    #[test]
    fn test_no_enum_is_empty() {
        let node = SchemaNode::new(Kind::Integer);
        assert!(resolve(&node, &FieldPath::root(), &EnumSources::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.yaml");
        std::fs::write(&path, "colors:\n  - red\n  - green\nsizes: [1, 2]\n").unwrap();

        let sources = EnumSources::load(&path).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get("colors").unwrap(), &[json!("red"), json!("green")]);
        assert_eq!(sources.get("sizes").unwrap(), &[json!(1), json!(2)]);
    }

    #[test]
    fn test_from_value() {
        let sources = EnumSources::from_value(json!({"hobbies": ["Reading"]})).unwrap();
        assert_eq!(sources.get("hobbies").unwrap().len(), 1);
    }
}
