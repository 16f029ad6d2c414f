//! Schema normalization
//!
//! Turns a raw JSON schema fragment into a canonical [`SchemaNode`],
//! resolving the `x-enum-source`, `x-multiselect` and `x-multiple-group`
//! directives. Normalization is pure: it never looks at enum sources or
//! group state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::core::config::DEFAULT_MAX_DEPTH;
use crate::core::error::FormError;
use crate::core::path::FieldPath;

/// Keys copied verbatim into [`SchemaNode::constraints`]
pub const CONSTRAINT_KEYS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "step",
    "minItems",
    "maxItems",
];

const ENUM_SOURCE_KEY: &str = "x-enum-source";
const MULTISELECT_KEY: &str = "x-multiselect";
const GROUP_KEY: &str = "x-multiple-group";

/// Base kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Object => "object",
        }
    }

    /// Parse a JSON Schema `type` name (`array` is handled by the normalizer)
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Kind::String),
            "integer" => Some(Kind::Integer),
            "number" => Some(Kind::Number),
            "boolean" => Some(Kind::Boolean),
            "object" => Some(Kind::Object),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Kind::Object)
    }

    /// Kinds whose values can be picked from an option list
    pub fn is_enumerable(&self) -> bool {
        matches!(self, Kind::String | Kind::Integer | Kind::Number)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized schema fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    pub kind: Kind,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Renderer hint (`widget` or `x-widget`), passed through untouched
    pub widget: Option<String>,
    pub default: Option<Value>,
    pub constraints: IndexMap<String, Value>,
    pub enum_values: Vec<Value>,
    pub enum_source_key: Option<String>,
    pub multiselect: bool,
    pub properties: IndexMap<String, SchemaNode>,
    pub group_templates: IndexMap<String, SchemaNode>,
}

impl SchemaNode {
    /// A bare node of the given kind
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            title: None,
            description: None,
            widget: None,
            default: None,
            constraints: IndexMap::new(),
            enum_values: Vec::new(),
            enum_source_key: None,
            multiselect: false,
            properties: IndexMap::new(),
            group_templates: IndexMap::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        !self.group_templates.is_empty()
    }
}

/// Normalize a root schema with the default depth limit
pub fn normalize(raw: &Value) -> Result<SchemaNode, FormError> {
    Normalizer::new(DEFAULT_MAX_DEPTH).normalize(raw)
}

/// Schema normalizer with a nesting bound
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    max_depth: usize,
}

impl Normalizer {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn normalize(&self, raw: &Value) -> Result<SchemaNode, FormError> {
        self.normalize_at(raw, &FieldPath::root(), None, 0)
    }

    fn normalize_at(
        &self,
        raw: &Value,
        path: &FieldPath,
        name: Option<&str>,
        depth: usize,
    ) -> Result<SchemaNode, FormError> {
        if depth > self.max_depth {
            return Err(FormError::SchemaCycle {
                path: path.clone(),
                max_depth: self.max_depth,
            });
        }

        let obj = raw
            .as_object()
            .ok_or_else(|| FormError::schema(path, "schema node must be a JSON object"))?;

        if obj.contains_key("properties") && obj.contains_key(GROUP_KEY) {
            return Err(FormError::schema(
                path,
                "`properties` and `x-multiple-group` cannot be combined on one node",
            ));
        }

        let (kind, array_items) = self.resolve_kind(obj, path)?;
        let mut node = SchemaNode::new(kind);

        node.title = str_key(obj, "title")
            .or_else(|| array_items.and_then(|items| str_key(items, "title")))
            .or_else(|| name.map(String::from));
        node.description = str_key(obj, "description");
        node.widget = str_key(obj, "widget").or_else(|| str_key(obj, "x-widget"));
        node.default = obj.get("default").cloned();

        for key in CONSTRAINT_KEYS {
            if let Some(value) = obj.get(*key) {
                node.constraints.insert((*key).to_string(), value.clone());
            }
        }

        // `{"type":"array","items":{"enum":[...]}}` is the standard spelling
        // of a multi-select; the enum lives on the items schema.
        let enum_holder = array_items.unwrap_or(obj);
        if let Some(values) = enum_holder.get("enum") {
            let values = values
                .as_array()
                .ok_or_else(|| FormError::schema(path, "`enum` must be an array"))?;
            node.enum_values = values.clone();
        }
        if let Some(key) = enum_holder.get(ENUM_SOURCE_KEY).or_else(|| obj.get(ENUM_SOURCE_KEY)) {
            let key = key
                .as_str()
                .ok_or_else(|| FormError::schema(path, "`x-enum-source` must be a string"))?;
            node.enum_source_key = Some(key.to_string());
        }

        let multiselect = match obj.get(MULTISELECT_KEY) {
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(FormError::schema(path, "`x-multiselect` must be a boolean"));
            }
            None => array_items.is_some(),
        };
        if multiselect && !kind.is_enumerable() {
            return Err(FormError::schema(
                path,
                format!("`x-multiselect` is not supported on {} fields", kind),
            ));
        }
        node.multiselect = multiselect;

        if kind == Kind::Object {
            if !node.enum_values.is_empty() || node.enum_source_key.is_some() {
                return Err(FormError::schema(
                    path,
                    "object nodes cannot carry `enum` or `x-enum-source`",
                ));
            }
            if let Some(props) = obj.get("properties") {
                let props = props
                    .as_object()
                    .ok_or_else(|| FormError::schema(path, "`properties` must be an object"))?;
                for (prop_name, prop) in props {
                    let child_path = path.join(prop_name.as_str());
                    let child = self.normalize_at(prop, &child_path, Some(prop_name), depth + 1)?;
                    node.properties.insert(prop_name.clone(), child);
                }
            }
            if let Some(groups) = obj.get(GROUP_KEY) {
                let groups = groups.as_object().ok_or_else(|| {
                    FormError::schema(path, "`x-multiple-group` must map labels to schemas")
                })?;
                for (label, template) in groups {
                    let template_path = path.join(label.as_str());
                    let template =
                        self.normalize_at(template, &template_path, Some(label), depth + 1)?;
                    node.group_templates.insert(label.clone(), template);
                }
            }
        } else if obj.contains_key("properties") || obj.contains_key(GROUP_KEY) {
            return Err(FormError::schema(
                path,
                format!("{} fields cannot declare `properties` or `x-multiple-group`", kind),
            ));
        }

        Ok(node)
    }

    /// Resolve the node's kind; for array multi-selects also return the items schema
    fn resolve_kind<'a>(
        &self,
        obj: &'a Map<String, Value>,
        path: &FieldPath,
    ) -> Result<(Kind, Option<&'a Map<String, Value>>), FormError> {
        let type_name = match obj.get("type") {
            Some(Value::String(name)) => Some(name.as_str()),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null"),
            Some(_) => return Err(FormError::schema(path, "`type` must be a string")),
            None => None,
        };

        match type_name {
            Some("array") => {
                let items = obj
                    .get("items")
                    .and_then(Value::as_object)
                    .filter(|items| items.contains_key("enum") || items.contains_key(ENUM_SOURCE_KEY))
                    .ok_or_else(|| {
                        FormError::schema(
                            path,
                            "arrays are only supported as multi-selects (`items` with `enum` or `x-enum-source`)",
                        )
                    })?;
                let item_kind = match items.get("type").and_then(Value::as_str) {
                    Some(name) => Kind::from_type_name(name)
                        .ok_or_else(|| FormError::schema(path, format!("unknown item type '{}'", name)))?,
                    None => Kind::String,
                };
                Ok((item_kind, Some(items)))
            }
            Some(name) => Kind::from_type_name(name)
                .map(|kind| (kind, None))
                .ok_or_else(|| FormError::schema(path, format!("unknown type '{}'", name))),
            None if obj.contains_key("properties") || obj.contains_key(GROUP_KEY) => {
                Ok((Kind::Object, None))
            }
            None => Err(FormError::schema(path, "node has no recognizable `type`")),
        }
    }
}

fn str_key(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_leaf_with_constraints() {
        let node = normalize(&json!({
            "type": "integer",
            "title": "Age",
            "minimum": 0,
            "maximum": 120,
            "default": 30,
            "unknown": true
        }))
        .unwrap();

        assert_eq!(node.kind, Kind::Integer);
        assert_eq!(node.title.as_deref(), Some("Age"));
        assert_eq!(node.default, Some(json!(30)));
        assert_eq!(node.constraints.len(), 2);
        assert_eq!(node.constraints["minimum"], json!(0));
        assert!(!node.multiselect);
    }

    #[test]
    fn test_properties_keep_order_and_title_fallback() {
        let node = normalize(&json!({
            "type": "object",
            "properties": {
                "zeta": {"type": "string"},
                "alpha": {"type": "boolean", "title": "Alpha!"}
            }
        }))
        .unwrap();

        let names: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(node.properties["zeta"].title.as_deref(), Some("zeta"));
        assert_eq!(node.properties["alpha"].title.as_deref(), Some("Alpha!"));
    }

    #[test]
    fn test_object_inferred_from_properties() {
        let node = normalize(&json!({"properties": {"a": {"type": "number"}}})).unwrap();
        assert_eq!(node.kind, Kind::Object);
    }

    #[test]
    fn test_missing_type_is_error() {
        let err = normalize(&json!({"title": "Nothing"})).unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }

    #[test]
    fn test_unknown_type_reports_path() {
        let err = normalize(&json!({
            "type": "object",
            "properties": {"when": {"type": "date"}}
        }))
        .unwrap_err();
        assert_eq!(err.path().to_string(), "when");
    }

    #[test]
    fn test_properties_and_group_rejected() {
        let err = normalize(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "x-multiple-group": {"Address": {"type": "object"}}
        }))
        .unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }

    #[test]
    fn test_group_templates() {
        let node = normalize(&json!({
            "type": "object",
            "x-multiple-group": {
                "Address": {"properties": {"street": {"type": "string"}}},
                "Phone": {"type": "string"}
            }
        }))
        .unwrap();

        assert!(node.is_group());
        assert!(node.properties.is_empty());
        let labels: Vec<&str> = node.group_templates.keys().map(String::as_str).collect();
        assert_eq!(labels, ["Address", "Phone"]);
        assert_eq!(node.group_templates["Address"].kind, Kind::Object);
    }

    #[test]
    fn test_multiselect_directive() {
        let node = normalize(&json!({
            "type": "string",
            "enum": ["Reading", "Gaming", "Hiking"],
            "x-multiselect": true
        }))
        .unwrap();
        assert!(node.multiselect);
        assert_eq!(node.enum_values.len(), 3);
    }

    #[test]
    fn test_multiselect_on_boolean_rejected() {
        let err = normalize(&json!({"type": "boolean", "x-multiselect": true})).unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }

    #[test]
    fn test_array_of_enum_is_multiselect() {
        let node = normalize(&json!({
            "type": "array",
            "items": {"type": "string", "enum": ["a", "b"]},
            "maxItems": 2
        }))
        .unwrap();
        assert_eq!(node.kind, Kind::String);
        assert!(node.multiselect);
        assert_eq!(node.enum_values, vec![json!("a"), json!("b")]);
        assert_eq!(node.constraints["maxItems"], json!(2));
    }

    #[test]
    fn test_plain_array_rejected() {
        let err = normalize(&json!({"type": "array", "items": {"type": "string"}})).unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }

    #[test]
    fn test_nullable_type_union() {
        let node = normalize(&json!({"type": ["null", "number"]})).unwrap();
        assert_eq!(node.kind, Kind::Number);
    }

    #[test]
    fn test_enum_source_and_widget() {
        let node = normalize(&json!({
            "type": "string",
            "x-enum-source": "colors",
            "x-widget": "radio"
        }))
        .unwrap();
        assert_eq!(node.enum_source_key.as_deref(), Some("colors"));
        assert_eq!(node.widget.as_deref(), Some("radio"));
    }

    #[test]
    fn test_enum_on_object_rejected() {
        let err = normalize(&json!({"type": "object", "enum": ["x"]})).unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }

    #[test]
    fn test_depth_limit() {
        let mut raw = json!({"type": "string"});
        for _ in 0..5 {
            raw = json!({"type": "object", "properties": {"inner": raw}});
        }
        let err = Normalizer::new(3).normalize(&raw).unwrap_err();
        assert!(matches!(err, FormError::SchemaCycle { max_depth: 3, .. }));
        assert!(Normalizer::new(5).normalize(&raw).is_ok());
    }
}
