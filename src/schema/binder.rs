//! Binding between descriptor trees and renderer field state
//!
//! Renderers expose two capabilities keyed by [`FieldPath`]: reading the
//! current raw value of a field and writing a value into it. `extract`
//! turns renderer state into a JSON document shaped like the schema;
//! `populate` pushes a document back onto the renderer.

use serde_json::{Map, Number, Value};

use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::compiler::FieldDescriptor;
use crate::schema::node::Kind;

/// Read side of a renderer
pub trait FieldReader {
    /// Current raw value of the field, `None` if the renderer has none
    fn read_field(&self, path: &FieldPath) -> Option<Value>;
}

/// Write side of a renderer
pub trait FieldWriter {
    fn write_field(&mut self, path: &FieldPath, value: Value);
}

impl<F> FieldReader for F
where
    F: Fn(&FieldPath) -> Option<Value>,
{
    fn read_field(&self, path: &FieldPath) -> Option<Value> {
        self(path)
    }
}

impl<F> FieldWriter for F
where
    F: FnMut(&FieldPath, Value),
{
    fn write_field(&mut self, path: &FieldPath, value: Value) {
        self(path, value)
    }
}

/// Result of an extraction: the document plus every per-field failure
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub errors: Vec<FormError>,
}

impl Extraction {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read the whole tree from `reader`
///
/// Coercion failures never abort the walk: the failing key is left out of
/// the document and the error is returned in [`Extraction::errors`].
pub fn extract(descriptor: &FieldDescriptor, reader: &impl FieldReader) -> Extraction {
    let mut errors = Vec::new();
    let value = extract_node(descriptor, reader, &mut errors).unwrap_or(Value::Null);
    for err in &errors {
        tracing::debug!("{}", err);
    }
    Extraction { value, errors }
}

fn extract_node(
    descriptor: &FieldDescriptor,
    reader: &impl FieldReader,
    errors: &mut Vec<FormError>,
) -> Option<Value> {
    if descriptor.is_leaf() {
        let raw = match reader.read_field(&descriptor.path) {
            None | Some(Value::Null) => return None,
            Some(raw) => raw,
        };
        let coerced = if descriptor.multiselect {
            coerce_selection(&raw, descriptor.kind, &descriptor.path)
        } else {
            coerce(&raw, descriptor.kind, &descriptor.path)
        };
        return match coerced {
            Ok(value) => Some(value),
            Err(err) => {
                errors.push(err);
                None
            }
        };
    }

    let mut map = Map::new();
    if descriptor.is_group() {
        for label in &descriptor.group_labels {
            let items = descriptor
                .group_slots
                .iter()
                .filter(|inst| &inst.label == label)
                .map(|inst| extract_node(&inst.fields, reader, errors).unwrap_or(Value::Null))
                .collect();
            map.insert(label.clone(), Value::Array(items));
        }
    } else {
        for child in &descriptor.children {
            let Some(key) = child.key() else { continue };
            if let Some(value) = extract_node(child, reader, errors) {
                map.insert(key.to_string(), value);
            }
        }
    }
    Some(Value::Object(map))
}

/// Write `value` onto the renderer, skipping fields it does not mention
pub fn populate(descriptor: &FieldDescriptor, value: &Value, writer: &mut impl FieldWriter) {
    if descriptor.is_leaf() {
        if !value.is_null() {
            writer.write_field(&descriptor.path, value.clone());
        }
        return;
    }

    let Some(map) = value.as_object() else {
        tracing::debug!("Skipping {}: expected an object", descriptor.path);
        return;
    };

    if descriptor.is_group() {
        for label in &descriptor.group_labels {
            let Some(items) = map.get(label).and_then(Value::as_array) else {
                continue;
            };
            let instances = descriptor
                .group_slots
                .iter()
                .filter(|inst| &inst.label == label);
            // Positional match; surplus values have no instance to land in.
            for (inst, item) in instances.zip(items) {
                populate(&inst.fields, item, writer);
            }
        }
        return;
    }

    for child in &descriptor.children {
        if let Some(child_value) = child.key().and_then(|key| map.get(key)) {
            populate(child, child_value, writer);
        }
    }
}

/// Write every compiled default onto the renderer
pub fn apply_defaults(descriptor: &FieldDescriptor, writer: &mut impl FieldWriter) {
    for leaf in descriptor.leaves() {
        if let Some(default) = &leaf.default {
            writer.write_field(&leaf.path, default.clone());
        }
    }
}

/// Coerce a raw renderer value to a scalar of `kind`
pub fn coerce(raw: &Value, kind: Kind, path: &FieldPath) -> Result<Value, FormError> {
    let coerced = match (kind, raw) {
        (Kind::String, Value::String(_)) => Some(raw.clone()),
        (Kind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (Kind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (Kind::Integer, Value::Number(n)) => integer_from_number(n),
        (Kind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (Kind::Number, Value::Number(_)) => Some(raw.clone()),
        (Kind::Number, Value::String(s)) => number_from_text(s.trim()),

        (Kind::Boolean, Value::Bool(_)) => Some(raw.clone()),
        (Kind::Boolean, Value::String(s)) => bool_from_text(s.trim()),
        (Kind::Boolean, Value::Number(n)) => match n.as_u64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },

        _ => None,
    };

    coerced.ok_or_else(|| FormError::ValueCoercion {
        path: path.clone(),
        expected: kind,
        found: raw.to_string(),
    })
}

/// Coerce a multi-select value: a sequence whose items are scalars of `kind`
pub fn coerce_selection(raw: &Value, kind: Kind, path: &FieldPath) -> Result<Value, FormError> {
    let items = raw.as_array().ok_or_else(|| FormError::ValueCoercion {
        path: path.clone(),
        expected: kind,
        found: raw.to_string(),
    })?;
    items
        .iter()
        .map(|item| coerce(item, kind, path))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return Some(Value::Number(n.clone()));
    }
    let f = n.as_f64()?;
    // `i64::MAX as f64` rounds up to 2^63, which no i64 can hold.
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn number_from_text(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn bool_from_text(s: &str) -> Option<Value> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(Value::Bool(true)),
        "false" | "no" | "0" => Some(Value::Bool(false)),
        _ => None,
    }
}
