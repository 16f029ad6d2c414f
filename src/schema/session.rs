//! A compiled form bound to one edited document
//!
//! The session owns the descriptor tree and the [`GroupManager`]. Group
//! mutations go through the session so the affected slot's subtree is
//! regenerated from the manager's instance list.

use serde_json::Value;

use crate::core::config::Config;
use crate::core::error::FormError;
use crate::core::path::FieldPath;
use crate::schema::binder::{self, Extraction, FieldReader, FieldWriter};
use crate::schema::compiler::{FieldDescriptor, NodeCompiler};
use crate::schema::enums::EnumSources;
use crate::schema::groups::{GroupInstance, GroupManager};
use crate::schema::node::{Normalizer, SchemaNode};

/// One compiled form and its live group state
#[derive(Debug, Clone)]
pub struct FormSession {
    root: FieldDescriptor,
    groups: GroupManager,
    issues: Vec<FormError>,
}

impl FormSession {
    /// Normalize and compile a raw schema document
    pub fn compile(raw: &Value, sources: EnumSources, config: &Config) -> Result<Self, FormError> {
        let schema = Normalizer::new(config.max_depth()).normalize(raw)?;
        Self::from_node(&schema, sources, config.max_depth())
    }

    /// Compile an already normalized schema
    pub fn from_node(schema: &SchemaNode, sources: EnumSources, max_depth: usize) -> Result<Self, FormError> {
        let compiled = NodeCompiler::new(&sources, max_depth).compile(schema, &FieldPath::root())?;
        let mut groups = GroupManager::new(sources, max_depth);
        for slot in compiled.slots {
            groups.register_slot(slot);
        }
        Ok(Self {
            root: compiled.descriptor,
            groups,
            issues: compiled.issues,
        })
    }

    /// The form model, with every group slot materialized
    pub fn root(&self) -> &FieldDescriptor {
        &self.root
    }

    /// Per-field compile errors, including those from instance templates
    pub fn issues(&self) -> &[FormError] {
        &self.issues
    }

    pub fn find(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        self.root.find(path)
    }

    /// Find a field from user-typed `a/b/Label/0/c` text
    pub fn lookup(&self, text: &str) -> Option<&FieldDescriptor> {
        self.root.lookup(text)
    }

    /// Add an instance of `label` to the slot at `slot_path`
    pub fn add_instance(&mut self, slot_path: &FieldPath, label: &str) -> Result<GroupInstance, FormError> {
        let instance = self.groups.add_instance(slot_path, label)?;
        self.issues.extend(self.groups.take_issues());
        self.refresh_slot(slot_path)?;
        Ok(instance)
    }

    /// Remove an instance; sibling ids and paths are left untouched
    ///
    /// Issues raised for fields inside the removed instance are dropped.
    pub fn remove_instance(&mut self, slot_path: &FieldPath, instance_id: u64) -> Result<(), FormError> {
        let root = self
            .list_instances(slot_path)?
            .iter()
            .find(|inst| inst.instance_id == instance_id)
            .map(|inst| inst.fields.path.clone());
        self.groups.remove_instance(slot_path, instance_id)?;
        if let Some(root) = root {
            self.issues.retain(|issue| !issue.path().starts_with(&root));
        }
        self.refresh_slot(slot_path)
    }

    /// Materialized instances of a slot in current order
    pub fn list_instances(&self, slot_path: &FieldPath) -> Result<&[GroupInstance], FormError> {
        self.root
            .find(slot_path)
            .filter(|_| self.groups.has_slot(slot_path))
            .map(|desc| desc.group_slots.as_slice())
            .ok_or_else(|| FormError::UnknownGroupSlot {
                slot: slot_path.clone(),
            })
    }

    /// Read the document from renderer state
    pub fn extract(&self, reader: &impl FieldReader) -> Extraction {
        binder::extract(&self.root, reader)
    }

    /// Write `value` onto the renderer using the current instances
    pub fn populate(&self, value: &Value, writer: &mut impl FieldWriter) {
        binder::populate(&self.root, value, writer)
    }

    pub fn apply_defaults(&self, writer: &mut impl FieldWriter) {
        binder::apply_defaults(&self.root, writer)
    }

    /// Grow group slots to fit `value`, then populate it
    pub fn load(&mut self, value: &Value, writer: &mut impl FieldWriter) -> Result<(), FormError> {
        self.grow_slots(&FieldPath::root(), value)?;
        self.populate(value, writer);
        Ok(())
    }

    fn grow_slots(&mut self, path: &FieldPath, value: &Value) -> Result<(), FormError> {
        let Some(map) = value.as_object() else {
            return Ok(());
        };
        let Some(desc) = self.root.find(path) else {
            return Ok(());
        };
        if desc.is_leaf() {
            return Ok(());
        }

        if !desc.is_group() {
            let children: Vec<(String, FieldPath)> = desc
                .children
                .iter()
                .filter_map(|c| c.key().map(|k| (k.to_string(), c.path.clone())))
                .collect();
            for (key, child_path) in children {
                if let Some(child_value) = map.get(&key) {
                    self.grow_slots(&child_path, child_value)?;
                }
            }
            return Ok(());
        }

        let labels = desc.group_labels.clone();
        for label in labels {
            let Some(items) = map.get(&label).and_then(Value::as_array) else {
                continue;
            };
            let existing = self
                .list_instances(path)?
                .iter()
                .filter(|inst| inst.label == label)
                .count();
            for _ in existing..items.len() {
                self.add_instance(path, &label)?;
            }

            let roots: Vec<FieldPath> = self
                .list_instances(path)?
                .iter()
                .filter(|inst| inst.label == label)
                .map(|inst| inst.fields.path.clone())
                .collect();
            for (root, item) in roots.iter().zip(items) {
                self.grow_slots(root, item)?;
            }
        }
        Ok(())
    }

    /// Regenerate the slot's descriptor subtree from the group manager
    fn refresh_slot(&mut self, slot_path: &FieldPath) -> Result<(), FormError> {
        let desc = self
            .root
            .find_mut(slot_path)
            .ok_or_else(|| FormError::UnknownGroupSlot {
                slot: slot_path.clone(),
            })?;
        materialize(desc, &self.groups);
        Ok(())
    }
}

/// Fill group slots in `desc` (recursively) from the manager's instance lists
fn materialize(desc: &mut FieldDescriptor, groups: &GroupManager) {
    if desc.is_group() {
        desc.group_slots = groups
            .list_instances(&desc.path)
            .map(<[GroupInstance]>::to_vec)
            .unwrap_or_default();
    }
    for child in &mut desc.children {
        materialize(child, groups);
    }
    for inst in &mut desc.group_slots {
        materialize(&mut inst.fields, groups);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemoryRenderer;
    use serde_json::json;

    fn contact_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "title": "Full name"},
                "dynamic": {
                    "type": "object",
                    "title": "Extra",
                    "x-multiple-group": {
                        "Address": {
                            "properties": {
                                "street": {"type": "string"},
                                "zip": {"type": "integer"},
                                "phones": {"x-multiple-group": {"Phone": {"type": "string"}}}
                            }
                        },
                        "Note": {"type": "string"}
                    }
                }
            }
        })
    }

    fn session() -> FormSession {
        FormSession::compile(&contact_schema(), EnumSources::new(), &Config::default()).unwrap()
    }

    fn slot() -> FieldPath {
        "dynamic".parse().unwrap()
    }

    fn ids(session: &FormSession) -> Vec<u64> {
        session
            .list_instances(&slot())
            .unwrap()
            .iter()
            .map(|i| i.instance_id)
            .collect()
    }

    #[test]
    fn test_address_id_sequence() {
        let mut session = session();
        session.add_instance(&slot(), "Address").unwrap();
        session.add_instance(&slot(), "Address").unwrap();
        assert_eq!(ids(&session), [0, 1]);

        session.remove_instance(&slot(), 0).unwrap();
        session.add_instance(&slot(), "Address").unwrap();
        assert_eq!(ids(&session), [1, 2]);
    }

    #[test]
    fn test_empty_slots_extract_as_empty_sequences() {
        let session = session();
        let out = session.extract(&MemoryRenderer::new());
        assert_eq!(out.value, json!({"dynamic": {"Address": [], "Note": []}}));
    }

    #[test]
    fn test_extract_group_instances_by_label() {
        let mut session = session();
        let a = session.add_instance(&slot(), "Address").unwrap();
        let n = session.add_instance(&slot(), "Note").unwrap();

        let mut renderer = MemoryRenderer::new();
        renderer.write_field(&a.fields.path.join("street"), json!("Main St"));
        renderer.write_field(&a.fields.path.join("zip"), json!("12345"));
        renderer.write_field(&n.fields.path, json!("call first"));

        let out = session.extract(&renderer);
        assert!(out.is_clean());
        assert_eq!(
            out.value["dynamic"],
            json!({
                "Address": [{"street": "Main St", "zip": 12345, "phones": {"Phone": []}}],
                "Note": ["call first"]
            })
        );
    }

    #[test]
    fn test_removal_keeps_sibling_paths() {
        let mut session = session();
        session.add_instance(&slot(), "Address").unwrap();
        let second = session.add_instance(&slot(), "Address").unwrap();
        session.remove_instance(&slot(), 0).unwrap();

        let remaining = session.list_instances(&slot()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].fields.path, second.fields.path);
        assert!(session.find(&"dynamic/Address/1/street".parse().unwrap()).is_some());
        assert!(session.find(&"dynamic/Address/0/street".parse().unwrap()).is_none());
    }

    #[test]
    fn test_nested_slot_materialized_in_tree() {
        let mut session = session();
        session.add_instance(&slot(), "Address").unwrap();
        let phones: FieldPath = "dynamic/Address/0/phones".parse().unwrap();
        session.add_instance(&phones, "Phone").unwrap();
        session.add_instance(&phones, "Phone").unwrap();

        assert_eq!(session.list_instances(&phones).unwrap().len(), 2);
        let top = session.list_instances(&slot()).unwrap();
        let nested = top[0].fields.find(&phones).unwrap();
        assert_eq!(nested.group_slots.len(), 2);
    }

    #[test]
    fn test_load_grows_slots_and_round_trips() {
        let mut session = session();
        let doc = json!({
            "name": "Ada",
            "dynamic": {
                "Address": [
                    {"street": "Main", "zip": 1, "phones": {"Phone": ["555-1", "555-2"]}},
                    {"street": "Side", "zip": 2, "phones": {"Phone": []}}
                ],
                "Note": ["hello"]
            }
        });

        let mut renderer = MemoryRenderer::new();
        session.load(&doc, &mut renderer).unwrap();

        assert_eq!(session.list_instances(&slot()).unwrap().len(), 3);
        let out = session.extract(&renderer);
        assert!(out.is_clean());
        assert_eq!(out.value, doc);
    }

    #[test]
    fn test_list_instances_of_non_group() {
        let session = session();
        let err = session.list_instances(&"name".parse().unwrap()).unwrap_err();
        assert!(matches!(err, FormError::UnknownGroupSlot { .. }));
    }

    #[test]
    fn test_template_issues_reach_session() {
        let schema = json!({
            "x-multiple-group": {"Tag": {"type": "string", "x-enum-source": "tags"}}
        });
        let mut session = FormSession::compile(&schema, EnumSources::new(), &Config::default()).unwrap();
        assert!(session.issues().is_empty());

        session.add_instance(&FieldPath::root(), "Tag").unwrap();
        assert_eq!(session.issues().len(), 1);
    }

    #[test]
    fn test_removing_instance_drops_its_issues() {
        let schema = json!({
            "properties": {
                "color": {"type": "string", "x-enum-source": "colors"},
                "tags": {"x-multiple-group": {"Tag": {"type": "string", "x-enum-source": "tags"}}}
            }
        });
        let mut session = FormSession::compile(&schema, EnumSources::new(), &Config::default()).unwrap();
        let tags: FieldPath = "tags".parse().unwrap();
        let first = session.add_instance(&tags, "Tag").unwrap();
        session.add_instance(&tags, "Tag").unwrap();
        assert_eq!(session.issues().len(), 3);

        session.remove_instance(&tags, first.instance_id).unwrap();
        let paths: Vec<String> = session.issues().iter().map(|i| i.path().to_string()).collect();
        assert_eq!(paths, ["color", "tags/Tag/1"]);
    }

    #[test]
    fn test_deepest_slot_within_depth_limit() {
        let schema = json!({
            "properties": {
                "dynamic": {
                    "x-multiple-group": {
                        "Address": {
                            "properties": {
                                "street": {"type": "string"},
                                "phones": {"x-multiple-group": {"Phone": {"type": "string"}}}
                            }
                        }
                    }
                }
            }
        });
        let config = Config {
            max_depth: Some(4),
            ..Config::default()
        };
        let mut session = FormSession::compile(&schema, EnumSources::new(), &config).unwrap();
        session.add_instance(&slot(), "Address").unwrap();
        let phones: FieldPath = "dynamic/Address/0/phones".parse().unwrap();
        let phone = session.add_instance(&phones, "Phone").unwrap();
        assert_eq!(phone.fields.path.to_string(), "dynamic/Address/0/phones/Phone/0");

        let shallow = Config {
            max_depth: Some(3),
            ..Config::default()
        };
        let err = FormSession::compile(&schema, EnumSources::new(), &shallow).unwrap_err();
        assert!(matches!(err, FormError::SchemaCycle { .. }));
    }

    #[test]
    fn test_lookup_digit_keys_and_instances() {
        let schema = json!({
            "properties": {
                "2024": {"type": "integer"},
                "dynamic": {"x-multiple-group": {"Address": {"properties": {"street": {"type": "string"}}}}}
            }
        });
        let mut session = FormSession::compile(&schema, EnumSources::new(), &Config::default()).unwrap();
        session.add_instance(&slot(), "Address").unwrap();

        let year = session.lookup("2024").unwrap();
        assert_eq!(year.path, FieldPath::root().join("2024"));
        assert!(session.find(&"2024".parse().unwrap()).is_none());

        let street = session.lookup("dynamic/Address/0/street").unwrap();
        assert_eq!(street.kind, crate::schema::node::Kind::String);
        assert!(session.lookup("dynamic/Address/5/street").is_none());
        assert!(session.lookup("dynamic/Pet/0").is_none());
    }

    #[test]
    fn test_properties_with_group_fail_to_compile() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "x-multiple-group": {"B": {"type": "string"}}
        });
        let err = FormSession::compile(&schema, EnumSources::new(), &Config::default()).unwrap_err();
        assert!(matches!(err, FormError::Schema { .. }));
    }
}
