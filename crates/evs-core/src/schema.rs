//! # Schema Tree
//!
//! In-memory form of a JSON-Schema-like document. Only `required`,
//! `properties`, `type` and `description` carry meaning; every other keyword
//! (`$id`, `$schema`, `title`, `examples`, ...) is ignored.
//!
//! Conversion from JSON is lenient: a node missing `required` or
//! `properties`, or a field missing `type`, still converts. The walker that
//! needs the absent key reports [`SchemaError::MissingSchemaKey`] when it gets
//! there, so one malformed field does not hide the rest of the tree from the
//! DDL formatter.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;

/// Abstract type name that selects a nested schema node.
pub const OBJECT_TYPE: &str = "object";

/// One level of a schema: its allowed fields and their specs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaNode {
    description: Option<String>,
    required: Option<Vec<String>>,
    properties: Option<IndexMap<String, FieldSpec>>,
}

/// Declared shape of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Leaf field carrying its declared abstract type name.
    Scalar(String),
    /// `"type": "object"` with the nested node.
    Object(SchemaNode),
}

/// A single entry under `properties`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    kind: Option<FieldKind>,
    description: Option<String>,
}

impl FieldKind {
    /// The abstract type name to resolve through a type map.
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Scalar(name) => name,
            FieldKind::Object(_) => OBJECT_TYPE,
        }
    }
}

impl FieldSpec {
    /// A leaf field of the given abstract type.
    pub fn scalar(type_name: impl Into<String>) -> Self {
        Self {
            kind: Some(FieldKind::Scalar(type_name.into())),
            description: None,
        }
    }

    /// An object field wrapping a nested node.
    pub fn object(node: SchemaNode) -> Self {
        Self {
            kind: Some(FieldKind::Object(node)),
            description: None,
        }
    }

    /// A field whose `type` key is absent.
    pub fn untyped() -> Self {
        Self {
            kind: None,
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declared kind, or `MissingSchemaKey("type")` when absent.
    pub fn kind(&self, path: &str) -> Result<&FieldKind, SchemaError> {
        self.kind
            .as_ref()
            .ok_or_else(|| SchemaError::missing_key("type", path))
    }

    /// Field description, if declared.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Nested node when this is an object field.
    pub fn nested(&self) -> Option<&SchemaNode> {
        match &self.kind {
            Some(FieldKind::Object(node)) => Some(node),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Self {
        let description = string_key(value, "description");
        let kind = match value.get("type").and_then(Value::as_str) {
            Some(OBJECT_TYPE) => Some(FieldKind::Object(SchemaNode::from_json(value))),
            Some(other) => Some(FieldKind::Scalar(other.to_string())),
            None => None,
        };
        Self { kind, description }
    }
}

impl SchemaNode {
    /// An empty node with `required` and `properties` both present.
    pub fn new() -> Self {
        Self {
            description: None,
            required: Some(Vec::new()),
            properties: Some(IndexMap::new()),
        }
    }

    /// Build a node from a parsed JSON value.
    ///
    /// Keys with the wrong JSON kind are treated as absent; non-string
    /// entries of `required` are dropped.
    pub fn from_json(value: &Value) -> Self {
        let required = value.get("required").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

        let properties = value
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, spec)| (name.clone(), FieldSpec::from_json(spec)))
                    .collect()
            });

        Self {
            description: string_key(value, "description"),
            required,
            properties,
        }
    }

    /// Add a field, declaring it both required and allowed.
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        self.required.get_or_insert_with(Vec::new).push(name.clone());
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name, spec);
        self
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the `required` list (`None` removes the key).
    pub fn with_required(mut self, required: Option<Vec<String>>) -> Self {
        self.required = required;
        self
    }

    /// Drop the `properties` key.
    pub fn without_properties(mut self) -> Self {
        self.properties = None;
        self
    }

    /// The node's `required` list, or `MissingSchemaKey("required")`.
    pub fn required(&self, path: &str) -> Result<&[String], SchemaError> {
        self.required
            .as_deref()
            .ok_or_else(|| SchemaError::missing_key("required", path))
    }

    /// The node's `properties`, or `MissingSchemaKey("properties")`.
    pub fn properties(&self, path: &str) -> Result<&IndexMap<String, FieldSpec>, SchemaError> {
        self.properties
            .as_ref()
            .ok_or_else(|| SchemaError::missing_key("properties", path))
    }

    /// Look up one declared field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.properties.as_ref().and_then(|props| props.get(name))
    }

    /// Node description, if declared.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

fn string_key(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
