//! # evs-core — Shared Schema Tree
//!
//! The leaf crate of the evs workspace. Both pipelines (event validation and
//! Hive DDL generation) walk the same tree, so the tree, its loader, the
//! abstract type maps and the closed-world field comparison live here.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `evs-*` crates.
//! - A loaded [`SchemaNode`] is never mutated; filtering works on copies.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod compare;
pub mod error;
pub mod loader;
pub mod schema;
pub mod types;

// Re-export primary types for ergonomic imports.
pub use compare::{compare_fields, FieldDiff, FieldViolation};
pub use error::{child_path, SchemaError, SchemaLoadError, ROOT_PATH};
pub use loader::{json_kind, load_schema, SCHEMA_FILENAME};
pub use schema::{FieldKind, FieldSpec, SchemaNode, OBJECT_TYPE};
pub use types::{TypeMap, ABSTRACT_TYPES};
