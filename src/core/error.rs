//! Form compilation and binding errors

use miette::Diagnostic;
use thiserror::Error;

use crate::core::path::FieldPath;
use crate::schema::node::Kind;

/// Errors raised while normalizing, compiling or binding a form
///
/// `UnresolvedEnumSource` and `ValueCoercion` are per-field: they are
/// collected into compile/extract reports instead of aborting the walk.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum FormError {
    #[error("Invalid schema at {path}: {message}")]
    #[diagnostic(
        code(jsonform::schema::invalid),
        help("Check the `type`, `properties` and `x-*` keys of this node")
    )]
    Schema { path: FieldPath, message: String },

    #[error("Enum source '{key}' referenced at {path} is not available")]
    #[diagnostic(
        code(jsonform::enums::unresolved),
        help("Pass a sources file with --sources or set `enum_sources` in the config")
    )]
    UnresolvedEnumSource { path: FieldPath, key: String },

    #[error("Schema nesting at {path} exceeds the maximum depth of {max_depth}")]
    #[diagnostic(
        code(jsonform::schema::cycle),
        help("Schemas must be finite trees; raise `max_depth` if the nesting is intentional")
    )]
    SchemaCycle { path: FieldPath, max_depth: usize },

    #[error("No group instance {instance_id} in slot {slot}")]
    #[diagnostic(code(jsonform::groups::instance_not_found))]
    InstanceNotFound { slot: FieldPath, instance_id: u64 },

    #[error("No repeatable group slot at {slot}")]
    #[diagnostic(code(jsonform::groups::unknown_slot))]
    UnknownGroupSlot { slot: FieldPath },

    #[error("Group slot {slot} has no template named '{label}'")]
    #[diagnostic(code(jsonform::groups::unknown_label))]
    UnknownGroupLabel { slot: FieldPath, label: String },

    #[error("Cannot read {found} as {expected} at {path}")]
    #[diagnostic(code(jsonform::binder::coercion))]
    ValueCoercion {
        path: FieldPath,
        expected: Kind,
        found: String,
    },
}

impl FormError {
    pub(crate) fn schema(path: &FieldPath, message: impl Into<String>) -> Self {
        FormError::Schema {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Path of the field or slot this error concerns
    pub fn path(&self) -> &FieldPath {
        match self {
            FormError::Schema { path, .. }
            | FormError::UnresolvedEnumSource { path, .. }
            | FormError::SchemaCycle { path, .. }
            | FormError::ValueCoercion { path, .. } => path,
            FormError::InstanceNotFound { slot, .. }
            | FormError::UnknownGroupSlot { slot }
            | FormError::UnknownGroupLabel { slot, .. } => slot,
        }
    }

    /// Per-field errors are reported alongside partial results
    pub fn is_per_field(&self) -> bool {
        matches!(
            self,
            FormError::UnresolvedEnumSource { .. } | FormError::ValueCoercion { .. }
        )
    }
}

/// Several per-field errors rendered as one diagnostic
#[derive(Debug, Error, Diagnostic)]
#[error("{summary}")]
#[diagnostic(code(jsonform::binder::extract_failed))]
pub struct FieldErrors {
    summary: String,

    #[related]
    errors: Vec<FormError>,
}

impl FieldErrors {
    pub fn new(errors: Vec<FormError>) -> Self {
        let count = errors.len();
        let summary = if count == 1 {
            "1 field could not be read".to_string()
        } else {
            format!("{} fields could not be read", count)
        };
        Self { summary, errors }
    }

    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }
}
