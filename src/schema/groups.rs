//! Repeatable group lifecycle
//!
//! Each `x-multiple-group` node owns one slot. Instance ids are allocated
//! per slot, start at 0 and are never reused, so removing an instance never
//! disturbs the paths of its siblings.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::compiler::{FieldDescriptor, NodeCompiler, PendingSlot};
use crate::schema::enums::EnumSources;
use crate::schema::node::SchemaNode;

/// One live instance of a repeatable group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInstance {
    /// Template the instance was created from
    pub label: String,
    pub instance_id: u64,
    /// Template compiled at `slot/label/instance_id`
    pub fields: FieldDescriptor,
}

#[derive(Debug, Clone)]
struct Slot {
    templates: IndexMap<String, SchemaNode>,
    depth: usize,
    next_id: u64,
    instances: Vec<GroupInstance>,
}

/// Owner of every group slot in a form session
#[derive(Debug, Clone)]
pub struct GroupManager {
    slots: IndexMap<FieldPath, Slot>,
    sources: EnumSources,
    max_depth: usize,
    issues: Vec<FormError>,
}

impl GroupManager {
    pub fn new(sources: EnumSources, max_depth: usize) -> Self {
        Self {
            slots: IndexMap::new(),
            sources,
            max_depth,
            issues: Vec::new(),
        }
    }

    /// Register a slot; re-registering an existing path keeps its state
    pub fn register_slot(&mut self, pending: PendingSlot) {
        tracing::debug!(
            "Registered group slot {} ({} templates)",
            pending.path,
            pending.templates.len()
        );
        self.slots.entry(pending.path).or_insert(Slot {
            templates: pending.templates,
            depth: pending.depth,
            next_id: 0,
            instances: Vec::new(),
        });
    }

    pub fn has_slot(&self, path: &FieldPath) -> bool {
        self.slots.contains_key(path)
    }

    /// Instantiate `label` in the slot, returning the new instance
    pub fn add_instance(&mut self, slot_path: &FieldPath, label: &str) -> Result<GroupInstance, FormError> {
        let slot = self.slot(slot_path)?;
        let template = slot
            .templates
            .get(label)
            .ok_or_else(|| FormError::UnknownGroupLabel {
                slot: slot_path.clone(),
                label: label.to_string(),
            })?;
        let instance_id = slot.next_id;
        let root = slot_path.join(label).join(instance_id);

        let compiled = NodeCompiler::new(&self.sources, self.max_depth)
            .compile_at(template, &root, slot.depth + 1)?;
        for err in &compiled.issues {
            tracing::debug!("{}", err);
        }
        self.issues.extend(compiled.issues);
        for pending in compiled.slots {
            self.register_slot(pending);
        }

        let instance = GroupInstance {
            label: label.to_string(),
            instance_id,
            fields: compiled.descriptor,
        };
        let slot = self.slot_mut(slot_path)?;
        slot.next_id += 1;
        slot.instances.push(instance.clone());

        tracing::debug!("Added {} instance {} to {}", label, instance_id, slot_path);
        Ok(instance)
    }

    /// Remove an instance and every slot nested inside it
    pub fn remove_instance(&mut self, slot_path: &FieldPath, instance_id: u64) -> Result<(), FormError> {
        let slot = self.slot_mut(slot_path)?;
        let index = slot
            .instances
            .iter()
            .position(|inst| inst.instance_id == instance_id)
            .ok_or_else(|| FormError::InstanceNotFound {
                slot: slot_path.clone(),
                instance_id,
            })?;
        let removed = slot.instances.remove(index);

        let root = removed.fields.path;
        self.slots.retain(|path, _| !path.starts_with(&root));

        tracing::debug!("Removed {} instance {} from {}", removed.label, instance_id, slot_path);
        Ok(())
    }

    /// Instances in insertion order (ids may have gaps)
    ///
    /// Each `fields` tree is the template as compiled when the instance was
    /// added; slots nested inside it are not filled in. Use
    /// [`FormSession::list_instances`](crate::schema::session::FormSession::list_instances)
    /// for the materialized view.
    pub fn list_instances(&self, slot_path: &FieldPath) -> Result<&[GroupInstance], FormError> {
        Ok(&self.slot(slot_path)?.instances)
    }

    /// Per-field errors raised while compiling instance templates
    pub fn take_issues(&mut self) -> Vec<FormError> {
        std::mem::take(&mut self.issues)
    }

    fn slot(&self, path: &FieldPath) -> Result<&Slot, FormError> {
        self.slots
            .get(path)
            .ok_or_else(|| FormError::UnknownGroupSlot { slot: path.clone() })
    }

    fn slot_mut(&mut self, path: &FieldPath) -> Result<&mut Slot, FormError> {
        self.slots
            .get_mut(path)
            .ok_or_else(|| FormError::UnknownGroupSlot { slot: path.clone() })
    }
}
