//! Interactive terminal renderer
//!
//! Walks a [`FormSession`] and prompts for every field with `dialoguer`.
//! Answers are kept in a [`MemoryRenderer`], so the session's binder reads
//! them back like any other renderer state.

use console::style;
use dialoguer::{theme::ColorfulTheme, Editor, Input, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

use crate::core::path::FieldPath;
use crate::render::memory::MemoryRenderer;
use crate::core::error::FormError;
use crate::schema::binder::{coerce, coerce_selection, FieldReader, FieldWriter};
use crate::schema::compiler::FieldDescriptor;
use crate::schema::node::Kind;
use crate::schema::session::FormSession;

/// Prompt-driven renderer backed by an in-memory field store
pub struct TerminalRenderer {
    theme: ColorfulTheme,
    values: MemoryRenderer,
}

enum GroupAction {
    Add(String),
    Remove(u64),
    Done,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::with_values(MemoryRenderer::new())
    }

    /// Start from pre-populated field values (defaults, a loaded document)
    pub fn with_values(values: MemoryRenderer) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            values,
        }
    }

    pub fn into_values(self) -> MemoryRenderer {
        self.values
    }

    /// Prompt for the whole form
    pub fn run(&mut self, session: &mut FormSession) -> Result<()> {
        let title = session.root().title.clone();

        println!();
        if title.is_empty() {
            println!("{} Filling form", style("◆").cyan());
        } else {
            println!("{} Filling {}", style("◆").cyan(), style(&title).bold());
        }
        println!("{}", style("─".repeat(50)).dim());
        println!();

        self.fill(session, &FieldPath::root())?;

        println!();
        println!("{} Values collected!", style("✓").green());
        Ok(())
    }

    fn fill(&mut self, session: &mut FormSession, path: &FieldPath) -> Result<()> {
        let Some(desc) = session.find(path).cloned() else {
            return Ok(());
        };

        if desc.is_leaf() {
            return self.prompt_leaf(&desc);
        }
        if desc.is_group() {
            return self.fill_group(session, &desc);
        }

        if !desc.path.is_root() {
            println!("{}", style(&desc.title).bold().underlined());
        }
        for child in &desc.children {
            self.fill(session, &child.path)?;
        }
        Ok(())
    }

    fn fill_group(&mut self, session: &mut FormSession, desc: &FieldDescriptor) -> Result<()> {
        // Instances loaded from a document are visited once before the menu.
        let existing: Vec<FieldPath> = desc
            .group_slots
            .iter()
            .map(|inst| inst.fields.path.clone())
            .collect();
        for root in existing {
            self.fill(session, &root)?;
        }

        loop {
            let instances = session.list_instances(&desc.path)?.to_vec();

            let mut actions = Vec::new();
            let mut items = Vec::new();
            for label in &desc.group_labels {
                items.push(format!("Add {}", label));
                actions.push(GroupAction::Add(label.clone()));
            }
            for inst in &instances {
                items.push(format!("Remove {} #{}", inst.label, inst.instance_id));
                actions.push(GroupAction::Remove(inst.instance_id));
            }
            items.push("Done".to_string());
            actions.push(GroupAction::Done);

            let prompt = format!("{} ({} entries)", desc.title, instances.len());
            let selection = Select::with_theme(&self.theme)
                .with_prompt(&prompt)
                .items(&items)
                .default(items.len() - 1)
                .interact()
                .into_diagnostic()?;

            match &actions[selection] {
                GroupAction::Add(label) => {
                    let inst = session.add_instance(&desc.path, label)?;
                    self.fill(session, &inst.fields.path)?;
                }
                GroupAction::Remove(id) => {
                    if let Some(inst) = instances.iter().find(|inst| inst.instance_id == *id) {
                        self.values.clear_under(&inst.fields.path);
                    }
                    session.remove_instance(&desc.path, *id)?;
                }
                GroupAction::Done => return Ok(()),
            }
        }
    }

    fn prompt_leaf(&mut self, desc: &FieldDescriptor) -> Result<()> {
        let prompt = format_prompt(desc);
        let current = self.values.read_field(&desc.path).or_else(|| desc.default.clone());

        if let Some(ref err) = desc.error {
            println!("{} {}", style("!").yellow(), style(err).dim());
        }

        let value = if !desc.options.is_empty() && desc.multiselect {
            let labels: Vec<String> = desc.options.iter().map(display_value).collect();
            let selected: Vec<bool> = desc
                .options
                .iter()
                .map(|opt| {
                    current
                        .as_ref()
                        .and_then(Value::as_array)
                        .is_some_and(|chosen| chosen.contains(opt))
                })
                .collect();

            let picks = MultiSelect::with_theme(&self.theme)
                .with_prompt(&prompt)
                .items(&labels)
                .defaults(&selected)
                .interact()
                .into_diagnostic()?;
            Some(Value::Array(
                picks.into_iter().map(|i| desc.options[i].clone()).collect(),
            ))
        } else if !desc.options.is_empty() {
            let labels: Vec<String> = desc.options.iter().map(display_value).collect();
            let default_idx = current
                .as_ref()
                .and_then(|c| desc.options.iter().position(|opt| opt == c))
                .unwrap_or(0);

            let selection = Select::with_theme(&self.theme)
                .with_prompt(&prompt)
                .items(&labels)
                .default(default_idx)
                .interact()
                .into_diagnostic()?;
            Some(desc.options[selection].clone())
        } else if desc.multiselect {
            // No options to pick from (none declared, or the source is missing).
            self.prompt_list(desc, &prompt, current.as_ref())?
        } else if desc.kind == Kind::Boolean {
            let default_val = current.as_ref().and_then(Value::as_bool).unwrap_or(false);
            let items = &["Yes", "No"];
            let default_idx = if default_val { 0 } else { 1 };

            let selection = Select::with_theme(&self.theme)
                .with_prompt(&prompt)
                .items(items)
                .default(default_idx)
                .interact()
                .into_diagnostic()?;
            Some(Value::Bool(selection == 0))
        } else if desc.widget.as_deref() == Some("textarea") {
            println!("{}", prompt);
            let initial = current.as_ref().map(display_value).unwrap_or_default();
            Editor::new()
                .edit(&initial)
                .into_diagnostic()?
                .map(Value::String)
        } else {
            self.prompt_text(desc, &prompt, current.as_ref())?
        };

        match value {
            Some(v) => self.values.write_field(&desc.path, v),
            None => self.values.clear_under(&desc.path),
        }
        Ok(())
    }

    fn prompt_text(
        &self,
        desc: &FieldDescriptor,
        prompt: &str,
        current: Option<&Value>,
    ) -> Result<Option<Value>> {
        let kind = desc.kind;
        let path = desc.path.clone();
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .validate_with(move |text: &String| -> std::result::Result<(), String> {
                if text.is_empty() {
                    return Ok(());
                }
                coerce(&Value::String(text.clone()), kind, &path)
                    .map(|_| ())
                    .map_err(|_| format!("Expected {}", kind))
            });
        if let Some(current) = current {
            input = input.default(display_value(current));
        }

        let text = input.interact_text().into_diagnostic()?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(coerce(&Value::String(text), kind, &desc.path)?))
    }

    fn prompt_list(
        &self,
        desc: &FieldDescriptor,
        prompt: &str,
        current: Option<&Value>,
    ) -> Result<Option<Value>> {
        let kind = desc.kind;
        let path = desc.path.clone();
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("{} (comma-separated)", prompt))
            .allow_empty(true)
            .validate_with(move |text: &String| -> std::result::Result<(), String> {
                parse_selection(text, kind, &path)
                    .map(|_| ())
                    .map_err(|_| format!("Expected a list of {}", kind))
            });
        if let Some(items) = current.and_then(Value::as_array) {
            if !items.is_empty() {
                let shown: Vec<String> = items.iter().map(display_value).collect();
                input = input.default(shown.join(", "));
            }
        }

        let text = input.interact_text().into_diagnostic()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(parse_selection(&text, desc.kind, &desc.path)?))
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldReader for TerminalRenderer {
    fn read_field(&self, path: &FieldPath) -> Option<Value> {
        self.values.read_field(path)
    }
}

impl FieldWriter for TerminalRenderer {
    fn write_field(&mut self, path: &FieldPath, value: Value) {
        self.values.write_field(path, value)
    }
}

/// Format the prompt for a field
fn format_prompt(desc: &FieldDescriptor) -> String {
    let mut prompt = desc.title.clone();
    if let (Some(min), Some(max)) = (desc.constraints.get("minimum"), desc.constraints.get("maximum")) {
        prompt = format!("{} [{}..{}]", prompt, min, max);
    }

    if let Some(ref desc_text) = desc.description {
        // Truncate long descriptions
        let short_desc = if desc_text.chars().count() > 50 {
            format!("{}...", desc_text.chars().take(47).collect::<String>())
        } else {
            desc_text.clone()
        };
        format!("{} ({})", prompt, style(short_desc).dim())
    } else {
        prompt
    }
}

/// Split comma-separated input into a selection of `kind` items
fn parse_selection(text: &str, kind: Kind, path: &FieldPath) -> Result<Value, FormError> {
    let items: Vec<Value> = text
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| Value::String(item.to_string()))
        .collect();
    coerce_selection(&Value::Array(items), kind, path)
}

/// Option and default values shown without JSON quoting
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("Red")), "Red");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!(true)), "true");
    }

    #[test]
    fn test_parse_selection_builds_sequence() {
        let path: FieldPath = "tags".parse().unwrap();
        assert_eq!(
            parse_selection("red, green ,, blue", Kind::String, &path).unwrap(),
            json!(["red", "green", "blue"])
        );
        assert_eq!(parse_selection("3, 1", Kind::Integer, &path).unwrap(), json!([3, 1]));
        assert!(parse_selection("3, x", Kind::Integer, &path).is_err());

        // What the prompt stores must extract cleanly as a multiselect.
        let desc = crate::schema::compiler::NodeCompiler::new(&Default::default(), 8)
            .compile(
                &crate::schema::node::normalize(&json!({
                    "properties": {"tags": {"type": "string", "x-multiselect": true}}
                }))
                .unwrap(),
                &FieldPath::root(),
            )
            .unwrap()
            .descriptor;
        assert!(desc.children[0].options.is_empty());

        let mut renderer = TerminalRenderer::new();
        renderer.write_field(&path, parse_selection("a, b", Kind::String, &path).unwrap());
        let out = crate::schema::binder::extract(&desc, &renderer);
        assert!(out.is_clean());
        assert_eq!(out.value, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_renderer_delegates_to_store() {
        let mut values = MemoryRenderer::new();
        values.set("name", json!("Ada"));
        let mut renderer = TerminalRenderer::with_values(values);

        let path: FieldPath = "age".parse().unwrap();
        renderer.write_field(&path, json!(3));
        assert_eq!(renderer.read_field(&"name".parse().unwrap()), Some(json!("Ada")));
        assert_eq!(renderer.into_values().len(), 2);
    }

    #[test]
    fn test_format_prompt_with_range() {
        let node = crate::schema::node::normalize(&json!({
            "type": "integer",
            "title": "Age",
            "minimum": 0,
            "maximum": 120
        }))
        .unwrap();
        let desc = crate::schema::compiler::NodeCompiler::new(&Default::default(), 8)
            .compile(&node, &FieldPath::root())
            .unwrap()
            .descriptor;
        assert_eq!(format_prompt(&desc), "Age [0..120]");
    }
}
