//! # Error Types
//!
//! Errors raised while loading a schema file or walking a loaded schema tree.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Load errors abort a pipeline before any walker runs.
//! - Schema errors carry the dotted path of the offending node so a log line
//!   points at the exact field (`address.number`), with `$root` for the top.

use std::path::PathBuf;

use thiserror::Error;

/// Path label used for the top-level schema node.
pub const ROOT_PATH: &str = "$root";

/// A structural problem found while walking a schema tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A schema node lacks a key the walker needs (`required`, `properties`,
    /// `type` or `description`).
    #[error("schema node '{path}' is missing the '{key}' key")]
    MissingSchemaKey {
        /// The absent key.
        key: &'static str,
        /// Dotted path of the schema node.
        path: String,
    },

    /// A declared type has no entry in the active type map.
    #[error("field '{path}' declares type '{type_name}', which has no entry in the type map")]
    UnknownType {
        /// The declared abstract type name.
        type_name: String,
        /// Dotted path of the field.
        path: String,
    },

    /// A column filter named a column the schema does not declare.
    #[error("column '{column}' is not declared in the schema properties")]
    UnknownColumn {
        /// The requested column name.
        column: String,
    },
}

impl SchemaError {
    /// Shorthand for [`SchemaError::MissingSchemaKey`].
    pub fn missing_key(key: &'static str, path: impl Into<String>) -> Self {
        Self::MissingSchemaKey {
            key,
            path: path.into(),
        }
    }

    /// Shorthand for [`SchemaError::UnknownType`].
    pub fn unknown_type(type_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            path: path.into(),
        }
    }
}

/// Failure to produce a schema tree from a file.
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The schema file does not exist.
    #[error("schema file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but is not valid JSON.
    #[error("schema file '{}' is not valid JSON: {reason}", path.display())]
    InvalidJson {
        /// Path of the file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The JSON root is not an object.
    #[error("schema file '{}' must contain a JSON object, found {actual}", path.display())]
    WrongShape {
        /// Path of the file.
        path: PathBuf,
        /// JSON kind found at the root.
        actual: &'static str,
    },

    /// Any other IO error while reading the file.
    #[error("io error reading schema: {0}")]
    Io(#[from] std::io::Error),
}

/// Join a parent path and a field name into a dotted path.
pub fn child_path(parent: &str, field: &str) -> String {
    if parent.is_empty() || parent == ROOT_PATH {
        field.to_string()
    } else {
        format!("{parent}.{field}")
    }
}
