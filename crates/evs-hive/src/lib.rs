//! # evs-hive — Hive DDL Generation
//!
//! Turns a [`SchemaNode`](evs_core::SchemaNode) into a
//! `CREATE EXTERNAL TABLE IF NOT EXISTS` statement and hands it to a
//! [`QueryExecutor`].
//!
//! - [`columns`]: column extraction and recursive `struct <...>` formatting.
//! - [`ddl`]: per-clause builders and the ordered assembler.
//! - [`config`]: YAML table configuration.
//! - [`executor`]: statement sinks.
//! - [`pipeline`]: schema + config → executed statement.
//!
//! Column formatting is best-effort: unresolvable fields are skipped and
//! reported on the [`DdlStatement`], never fatal.

pub mod columns;
pub mod config;
pub mod ddl;
pub mod executor;
pub mod pipeline;

pub use columns::{
    column_types, columns, table_comment, ColumnFormatter, ColumnMap, FormattedColumns,
    STRUCT_SEPARATOR, TOP_LEVEL_SEPARATOR,
};
pub use config::{ConfigError, TableConfig};
pub use ddl::{assemble, DdlSpec, DdlStatement, DdlWarning, PropertyMap};
pub use executor::{DryRunExecutor, ExecutionHandle, ExecutorError, QueryExecutor, SqlFileExecutor};
#[cfg(any(test, feature = "test-util"))]
pub use executor::RecordingExecutor;
pub use pipeline::{PipelineError, TableOutput, TablePipeline};
