//! # Schema Loader
//!
//! Reads a schema document from disk and converts it into a [`SchemaNode`].
//! A missing file, malformed JSON or a non-object root are all load errors;
//! callers treat them as "no schema available" and stop before validating or
//! formatting anything.

use std::path::Path;

use serde_json::Value;

use crate::error::SchemaLoadError;
use crate::schema::SchemaNode;

/// Default schema filename looked up next to the working directory.
pub const SCHEMA_FILENAME: &str = "schema.json";

/// Load and convert the schema file at `path`.
///
/// # Errors
///
/// Returns [`SchemaLoadError::NotFound`] when the file does not exist,
/// [`SchemaLoadError::InvalidJson`] when it cannot be parsed, and
/// [`SchemaLoadError::WrongShape`] when the root is not a JSON object.
pub fn load_schema(path: impl AsRef<Path>) -> Result<SchemaNode, SchemaLoadError> {
    let path = path.as_ref();
    let value = read_schema_value(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "schema load failed");
        e
    })?;
    tracing::info!(path = %path.display(), "schema loaded");
    Ok(SchemaNode::from_json(&value))
}

/// Parse the raw JSON document without converting it.
pub fn read_schema_value(path: &Path) -> Result<Value, SchemaLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SchemaLoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SchemaLoadError::Io(e),
    })?;

    let value: Value =
        serde_json::from_str(&content).map_err(|e| SchemaLoadError::InvalidJson {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !value.is_object() {
        return Err(SchemaLoadError::WrongShape {
            path: path.to_path_buf(),
            actual: json_kind(&value),
        });
    }
    Ok(value)
}

/// Name of a JSON value's kind, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
