//! # Event Validation
//!
//! Walks an event and a [`SchemaNode`] in lock-step, one level per
//! recursion. At each level:
//!
//! 1. The value must not be empty (`null`, `{}`, `[]`, `""`).
//! 2. The value must be a JSON object.
//! 3. Its field set must equal the node's `required` list exactly.
//! 4. Every field's runtime kind must match its declared type.
//! 5. The first field holding a nested object is validated recursively and
//!    its result is returned at once. Fields after it at the same level are
//!    not inspected.
//!
//! Validation is fail-fast: the first violation is returned and logged.
//! Each decision point emits exactly one `tracing` event.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde_json::{Map, Value};
use thiserror::Error;

use evs_core::{
    child_path, compare_fields, json_kind, FieldKind, FieldViolation, SchemaError, SchemaNode,
    TypeMap, ROOT_PATH,
};

/// Runtime kind a JSON value must have to satisfy an abstract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// JSON string.
    String,
    /// JSON number without a fractional part (`i64` or `u64`).
    Integer,
    /// JSON object.
    Object,
    /// JSON boolean. Never accepted where an integer is expected.
    Boolean,
}

impl ValueKind {
    /// Whether `value` has this kind.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Object => value.is_object(),
            ValueKind::Boolean => value.is_boolean(),
        }
    }
}

/// The default abstract-type → value-kind map.
pub fn value_types() -> &'static TypeMap<ValueKind> {
    static VALUE_TYPES: OnceLock<TypeMap<ValueKind>> = OnceLock::new();
    VALUE_TYPES.get_or_init(|| {
        TypeMap::new([
            ("string", ValueKind::String),
            ("integer", ValueKind::Integer),
            ("object", ValueKind::Object),
            ("boolean", ValueKind::Boolean),
        ])
    })
}

/// Why an event was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The value at `path` is empty.
    #[error("event is empty at '{path}'")]
    EmptyDocument {
        /// Dotted path of the empty value.
        path: String,
    },

    /// The value at `path` is not a JSON object.
    #[error("wrong data structure at '{path}': expected object, found {actual}")]
    WrongShape {
        /// Dotted path of the value.
        path: String,
        /// JSON kind found.
        actual: &'static str,
    },

    /// Required fields are absent.
    #[error("'{path}' is missing required field(s): {}", field_list(.fields))]
    MissingRequiredField {
        /// Dotted path of the object level.
        path: String,
        /// Absent field names, sorted.
        fields: BTreeSet<String>,
    },

    /// Fields not registered in the schema are present.
    #[error("'{path}' has field(s) not registered in the schema: {}", field_list(.fields))]
    UnregisteredField {
        /// Dotted path of the object level.
        path: String,
        /// Unexpected field names, sorted.
        fields: BTreeSet<String>,
    },

    /// A field's runtime kind differs from its declared type.
    #[error("field '{field}' has the wrong type: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Dotted path of the field.
        field: String,
        /// Declared abstract type.
        expected: String,
        /// JSON kind found.
        actual: &'static str,
    },

    /// The schema itself cannot answer the question asked of it.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn field_list(fields: &BTreeSet<String>) -> String {
    fields
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether a value counts as an empty event.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Validates events against schema trees.
///
/// Holds only a borrowed type map, so a validator is cheap to build per
/// event and never mutates the schema or the event.
#[derive(Debug, Clone, Copy)]
pub struct EventValidator<'m> {
    types: &'m TypeMap<ValueKind>,
}

impl Default for EventValidator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl EventValidator<'static> {
    /// A validator using [`value_types`].
    pub fn new() -> Self {
        Self {
            types: value_types(),
        }
    }
}

impl<'m> EventValidator<'m> {
    /// A validator resolving declared types through `types` instead of the
    /// default map.
    pub fn with_types(types: &'m TypeMap<ValueKind>) -> Self {
        Self { types }
    }

    /// Step 1: reject an empty event.
    pub fn validate_not_empty(&self, event: &Value) -> Result<(), ValidationError> {
        self.check_not_empty(event, ROOT_PATH)
    }

    /// Step 2: require a JSON object, returning its map.
    pub fn validate_structure<'e>(
        &self,
        event: &'e Value,
    ) -> Result<&'e Map<String, Value>, ValidationError> {
        self.check_structure(event, ROOT_PATH)
    }

    /// Step 3 at the top level: the event's field set must equal the
    /// schema's `required` list.
    pub fn compare_event_fields(
        &self,
        schema: &SchemaNode,
        event: &Map<String, Value>,
    ) -> Result<(), ValidationError> {
        self.compare_level(schema, event, ROOT_PATH)
    }

    /// Steps 3–6 for an event already known to be a non-empty object.
    pub fn validate_content(
        &self,
        schema: &SchemaNode,
        event: &Map<String, Value>,
    ) -> Result<(), ValidationError> {
        self.walk_object(schema, event, ROOT_PATH)?;
        tracing::info!("event content validated");
        Ok(())
    }

    /// Full validation of an arbitrary value.
    pub fn validate(&self, schema: &SchemaNode, event: &Value) -> Result<(), ValidationError> {
        self.validate_not_empty(event)?;
        let map = self.validate_structure(event)?;
        self.validate_content(schema, map)
    }

    /// [`validate`](Self::validate) collapsed to a verdict.
    pub fn is_valid(&self, schema: &SchemaNode, event: &Value) -> bool {
        self.validate(schema, event).is_ok()
    }

    fn check_not_empty(&self, value: &Value, path: &str) -> Result<(), ValidationError> {
        if is_empty_value(value) {
            tracing::error!(path, "event is empty");
            return Err(ValidationError::EmptyDocument {
                path: path.to_string(),
            });
        }
        tracing::info!(path, "event is not empty");
        Ok(())
    }

    fn check_structure<'e>(
        &self,
        value: &'e Value,
        path: &str,
    ) -> Result<&'e Map<String, Value>, ValidationError> {
        match value.as_object() {
            Some(map) => {
                tracing::info!(path, "event has the expected object structure");
                Ok(map)
            }
            None => {
                let actual = json_kind(value);
                tracing::error!(path, expected = "object", actual, "wrong event data structure");
                Err(ValidationError::WrongShape {
                    path: path.to_string(),
                    actual,
                })
            }
        }
    }

    fn compare_level(
        &self,
        schema: &SchemaNode,
        event: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValidationError> {
        let required = schema.required(path).map_err(|e| {
            tracing::error!(path, error = %e, "schema node cannot be compared");
            e
        })?;

        let diff = compare_fields(
            required.iter().map(String::as_str),
            event.keys().map(String::as_str),
        );

        match diff.check() {
            Ok(()) => {
                tracing::info!(path, "event fields match the schema");
                Ok(())
            }
            Err(FieldViolation::Missing(fields)) => {
                tracing::error!(path, missing = ?fields, "event lacks required fields");
                Err(ValidationError::MissingRequiredField {
                    path: path.to_string(),
                    fields,
                })
            }
            Err(FieldViolation::Unregistered(fields)) => {
                tracing::error!(path, unregistered = ?fields, "event has fields not registered in the schema");
                Err(ValidationError::UnregisteredField {
                    path: path.to_string(),
                    fields,
                })
            }
        }
    }

    fn walk_object(
        &self,
        schema: &SchemaNode,
        event: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValidationError> {
        let properties = schema.properties(path).map_err(|e| {
            tracing::error!(path, error = %e, "schema node declares no properties");
            e
        })?;
        self.compare_level(schema, event, path)?;

        for (name, value) in event {
            let field_path = child_path(path, name);

            // `required` names a field that `properties` never declares.
            let Some(spec) = properties.get(name) else {
                tracing::error!(field = %field_path, "required field has no declared spec");
                return Err(ValidationError::MissingRequiredField {
                    path: path.to_string(),
                    fields: BTreeSet::from([name.clone()]),
                });
            };

            let kind = spec.kind(&field_path).map_err(|e| {
                tracing::error!(field = %field_path, "field spec has no declared type");
                e
            })?;
            let expected = self.types.resolve(kind.type_name(), &field_path).map_err(|e| {
                tracing::error!(field = %field_path, type_name = kind.type_name(), "declared type has no entry in the type map");
                e
            })?;

            if !expected.matches(value) {
                let actual = json_kind(value);
                tracing::error!(
                    field = %field_path,
                    expected = kind.type_name(),
                    actual,
                    "field type differs from the schema"
                );
                return Err(ValidationError::TypeMismatch {
                    field: field_path,
                    expected: kind.type_name().to_string(),
                    actual,
                });
            }

            if value.is_object() {
                let FieldKind::Object(nested) = kind else {
                    tracing::error!(field = %field_path, "object value has no nested schema");
                    return Err(SchemaError::missing_key("properties", field_path).into());
                };
                // The nested result ends this level's walk.
                return self.walk_nested(nested, value, &field_path);
            }
        }

        Ok(())
    }

    fn walk_nested(
        &self,
        schema: &SchemaNode,
        value: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        self.check_not_empty(value, path)?;
        let map = self.check_structure(value, path)?;
        self.walk_object(schema, map, path)
    }
}
