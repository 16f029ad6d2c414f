//! Recursive compilation of schema nodes into field descriptors

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::enums::{self, EnumSources};
use crate::schema::groups::GroupInstance;
use crate::schema::node::{Kind, SchemaNode};

/// Compiled, renderer-facing unit of the form model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub path: FieldPath,
    pub kind: Kind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub constraints: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    pub multiselect: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldDescriptor>,
    /// Template labels, non-empty only for repeatable group nodes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_labels: Vec<String>,
    /// Live group instances in slot order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_slots: Vec<GroupInstance>,
    /// Per-field compile problem (e.g. an unresolved enum source)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldDescriptor {
    fn from_node(node: &SchemaNode, path: &FieldPath) -> Self {
        let title = node
            .title
            .clone()
            .or_else(|| path.last_key().map(String::from))
            .unwrap_or_default();

        Self {
            path: path.clone(),
            kind: node.kind,
            title,
            description: node.description.clone(),
            widget: node.widget.clone(),
            default: node.default.clone(),
            constraints: node.constraints.clone(),
            options: Vec::new(),
            multiselect: node.multiselect,
            children: Vec::new(),
            group_labels: Vec::new(),
            group_slots: Vec::new(),
            error: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind.is_leaf()
    }

    pub fn is_group(&self) -> bool {
        !self.group_labels.is_empty()
    }

    /// Key this field occupies in its parent's value mapping
    pub fn key(&self) -> Option<&str> {
        self.path.last_key()
    }

    /// Find the descriptor at `path` in this subtree
    pub fn find(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        if &self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children
            .iter()
            .chain(self.group_slots.iter().map(|inst| &inst.fields))
            .find_map(|child| child.find(path))
    }

    /// Mutable variant of [`find`](Self::find)
    pub fn find_mut(&mut self, path: &FieldPath) -> Option<&mut FieldDescriptor> {
        if &self.path == path {
            return Some(self);
        }
        if !path.starts_with(&self.path) {
            return None;
        }
        self.children
            .iter_mut()
            .chain(self.group_slots.iter_mut().map(|inst| &mut inst.fields))
            .find_map(|child| child.find_mut(path))
    }

    /// Find a descriptor from its `/`-separated text form
    ///
    /// Segments are matched against the tree rather than parsed on their
    /// own, so a property named `2024` resolves as a key while the segment
    /// after a group label is read as an instance id. Keys containing `/`
    /// cannot be addressed this way.
    pub fn lookup(&self, text: &str) -> Option<&FieldDescriptor> {
        let mut parts = text.split('/').filter(|part| !part.is_empty());
        let mut current = self;
        while let Some(part) = parts.next() {
            current = if current.is_group() {
                let id: u64 = parts.next()?.parse().ok()?;
                &current
                    .group_slots
                    .iter()
                    .find(|inst| inst.label == part && inst.instance_id == id)?
                    .fields
            } else {
                current.children.iter().find(|child| child.key() == Some(part))?
            };
        }
        Some(current)
    }

    /// Leaf descriptors in document order, including those inside group instances
    pub fn leaves(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        if self.is_leaf() {
            out.push(self);
            return;
        }
        for child in &self.children {
            child.collect_leaves(out);
        }
        for inst in &self.group_slots {
            inst.fields.collect_leaves(out);
        }
    }
}

/// A group slot discovered during compilation, awaiting registration
#[derive(Debug, Clone)]
pub struct PendingSlot {
    pub path: FieldPath,
    pub templates: IndexMap<String, SchemaNode>,
    /// Nesting depth of the group node; templates sit one level below
    pub depth: usize,
}

/// Output of one compilation pass
#[derive(Debug, Clone)]
pub struct Compiled {
    pub descriptor: FieldDescriptor,
    pub slots: Vec<PendingSlot>,
    /// Per-field errors; the descriptors concerned carry `error`
    pub issues: Vec<FormError>,
}

/// Walks a [`SchemaNode`] tree producing descriptors
pub struct NodeCompiler<'a> {
    sources: &'a EnumSources,
    max_depth: usize,
    slots: Vec<PendingSlot>,
    issues: Vec<FormError>,
}

impl<'a> NodeCompiler<'a> {
    pub fn new(sources: &'a EnumSources, max_depth: usize) -> Self {
        Self {
            sources,
            max_depth,
            slots: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Compile a whole subtree; structural errors abort, per-field ones are collected
    pub fn compile(self, node: &SchemaNode, prefix: &FieldPath) -> Result<Compiled, FormError> {
        self.compile_at(node, prefix, 0)
    }

    /// Compile a subtree whose root sits `depth` levels below the schema root
    ///
    /// Depth counts schema nesting (properties and group templates), the
    /// same way [`Normalizer`](crate::schema::node::Normalizer) does, not
    /// path segments.
    pub fn compile_at(
        mut self,
        node: &SchemaNode,
        prefix: &FieldPath,
        depth: usize,
    ) -> Result<Compiled, FormError> {
        let descriptor = self.compile_node(node, prefix, depth)?;
        tracing::debug!(
            "Compiled {} ({} group slots, {} issues)",
            prefix,
            self.slots.len(),
            self.issues.len()
        );
        Ok(Compiled {
            descriptor,
            slots: self.slots,
            issues: self.issues,
        })
    }

    fn compile_node(
        &mut self,
        node: &SchemaNode,
        path: &FieldPath,
        depth: usize,
    ) -> Result<FieldDescriptor, FormError> {
        // Schemas are finite trees; unbounded nesting means something cycled.
        if depth > self.max_depth {
            return Err(FormError::SchemaCycle {
                path: path.clone(),
                max_depth: self.max_depth,
            });
        }

        let mut descriptor = FieldDescriptor::from_node(node, path);

        if node.kind.is_leaf() {
            match enums::resolve(node, path, self.sources) {
                Ok(options) => descriptor.options = options,
                Err(err) => {
                    tracing::debug!("{}", err);
                    descriptor.error = Some(err.to_string());
                    self.issues.push(err);
                }
            }
            return Ok(descriptor);
        }

        if node.is_group() {
            descriptor.group_labels = node.group_templates.keys().cloned().collect();
            self.slots.push(PendingSlot {
                path: path.clone(),
                templates: node.group_templates.clone(),
                depth,
            });
            return Ok(descriptor);
        }

        for (name, child) in &node.properties {
            let child_path = path.join(name.as_str());
            descriptor.children.push(self.compile_node(child, &child_path, depth + 1)?);
        }
        Ok(descriptor)
    }
}
