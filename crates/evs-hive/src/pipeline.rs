//! # Table Pipeline
//!
//! Schema + [`TableConfig`] in, one executed `CREATE EXTERNAL TABLE` out.
//! Missing schema and unknown partition columns abort before anything is
//! executed; skipped columns and an incomplete clustering setup do not.

use thiserror::Error;

use evs_core::{SchemaError, SchemaNode};

use crate::columns::{columns, table_comment, ColumnFormatter};
use crate::config::TableConfig;
use crate::ddl::{assemble, DdlSpec, DdlStatement};
use crate::executor::{ExecutionHandle, ExecutorError, QueryExecutor};

/// Why no statement was executed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The schema could not be loaded, so no statement was built.
    #[error("no schema available; table statement was not built")]
    SchemaUnavailable,

    /// The schema cannot supply the configured columns.
    #[error("schema does not fit the table config: {0}")]
    Schema(#[from] SchemaError),

    /// The executor refused or failed the statement.
    #[error("statement execution failed: {0}")]
    Execution(#[from] ExecutorError),
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutput {
    /// The statement that was submitted.
    pub statement: DdlStatement,
    /// What the executor reported back.
    pub handle: ExecutionHandle,
}

/// Builds the table statement for one schema and submits it.
#[derive(Debug)]
pub struct TablePipeline<E> {
    schema: Option<SchemaNode>,
    config: TableConfig,
    executor: E,
}

impl<E: QueryExecutor> TablePipeline<E> {
    /// `schema` is `None` when loading failed.
    pub fn new(schema: Option<SchemaNode>, config: TableConfig, executor: E) -> Self {
        Self {
            schema,
            config,
            executor,
        }
    }

    /// The table settings this pipeline was built with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The executor statements are submitted to.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The statement for the configured table, without executing it.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SchemaUnavailable`] without a schema, and
    /// [`PipelineError::Schema`] when the root has no properties or a
    /// partition column is not declared.
    pub fn build(&self) -> Result<DdlStatement, PipelineError> {
        let Some(schema) = &self.schema else {
            tracing::error!("no schema available; aborting before column collection");
            return Err(PipelineError::SchemaUnavailable);
        };
        let config = &self.config;

        let table_columns = columns(schema, None)?;
        let partition_columns = match &config.partition_columns {
            Some(names) => columns(schema, Some(names))?,
            None => Default::default(),
        };

        let mut spec = DdlSpec::new(&config.database, &config.table)
            .with_columns(table_columns)
            .with_partition_columns(partition_columns)
            .with_clustering(config.clustering_columns.clone(), config.num_buckets)
            .with_serde_properties(config.serde_properties.clone())
            .with_tbl_properties(config.tbl_properties.clone());
        spec.row_format = config.row_format.clone();
        spec.file_format = config.file_format.clone();
        spec.location = config.location.clone();

        let mut comment_error = None;
        match table_comment(schema) {
            Ok(comment) => spec.comment = Some(comment.to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "schema has no description; table comment omitted");
                comment_error = Some(e);
            }
        }

        let types = config.column_types();
        let mut statement = assemble(&spec, &ColumnFormatter::with_types(&types));
        statement.column_errors.extend(comment_error);
        Ok(statement)
    }

    /// Build the statement and submit it exactly once.
    ///
    /// # Errors
    ///
    /// Everything [`TablePipeline::build`] returns, plus
    /// [`PipelineError::Execution`] when the executor fails.
    pub fn run(&self) -> Result<TableOutput, PipelineError> {
        let statement = self.build()?;
        let handle = self.executor.execute(&statement.text).map_err(|e| {
            tracing::error!(error = %e, table = %self.config.qualified_name(), "statement execution failed");
            PipelineError::Execution(e)
        })?;
        tracing::info!(
            table = %self.config.qualified_name(),
            execution_id = %handle.execution_id,
            "table statement executed"
        );
        Ok(TableOutput { statement, handle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingExecutor;
    use evs_core::FieldSpec;

    fn schema() -> SchemaNode {
        SchemaNode::new()
            .with_description("people")
            .with_field("name", FieldSpec::scalar("string"))
            .with_field("age", FieldSpec::scalar("integer").with_description("years"))
    }

    fn bare_config() -> TableConfig {
        TableConfig {
            partition_columns: None,
            clustering_columns: Vec::new(),
            num_buckets: None,
            row_format: None,
            file_format: None,
            serde_properties: Default::default(),
            location: None,
            tbl_properties: Default::default(),
            ..TableConfig::default()
        }
    }

    #[test]
    fn run_executes_statement_once() {
        let pipeline = TablePipeline::new(Some(schema()), bare_config(), RecordingExecutor::new());
        let output = pipeline.run().unwrap();
        assert_eq!(
            output.statement.text,
            "CREATE EXTERNAL TABLE IF NOT EXISTS db_people.tb_user\n\
             (name varchar,\nage tinyint COMMENT 'years')\n\
             COMMENT 'people'"
        );
        assert_eq!(pipeline.executor().statements(), vec![output.statement.text]);
    }

    #[test]
    fn partition_filter_selects_columns() {
        let config = TableConfig {
            partition_columns: Some(vec!["age".into()]),
            ..bare_config()
        };
        let pipeline = TablePipeline::new(Some(schema()), config, RecordingExecutor::new());
        let statement = pipeline.build().unwrap();
        assert!(statement
            .text
            .ends_with("\nPARTITIONED BY (age tinyint COMMENT 'years')"));
    }

    #[test]
    fn empty_partition_list_partitions_by_every_column() {
        let config = TableConfig {
            partition_columns: Some(Vec::new()),
            ..bare_config()
        };
        let pipeline = TablePipeline::new(Some(schema()), config, RecordingExecutor::new());
        let statement = pipeline.build().unwrap();
        assert!(statement
            .text
            .ends_with("\nPARTITIONED BY (name varchar,\nage tinyint COMMENT 'years')"));
    }

    #[test]
    fn unknown_partition_column_aborts() {
        let config = TableConfig {
            partition_columns: Some(vec!["country".into()]),
            ..bare_config()
        };
        let pipeline = TablePipeline::new(Some(schema()), config, RecordingExecutor::new());
        assert!(matches!(
            pipeline.run(),
            Err(PipelineError::Schema(SchemaError::UnknownColumn { .. }))
        ));
        assert_eq!(pipeline.executor().count(), 0);
    }

    #[test]
    fn missing_schema_aborts_before_execution() {
        let pipeline = TablePipeline::new(None, bare_config(), RecordingExecutor::new());
        assert!(matches!(pipeline.run(), Err(PipelineError::SchemaUnavailable)));
        assert_eq!(pipeline.executor().count(), 0);
    }

    #[test]
    fn missing_description_is_recorded_not_fatal() {
        let schema = SchemaNode::new().with_field("name", FieldSpec::scalar("string"));
        let pipeline = TablePipeline::new(Some(schema), bare_config(), RecordingExecutor::new());
        let statement = pipeline.build().unwrap();
        assert!(!statement.text.contains("COMMENT"));
        assert_eq!(statement.column_errors.len(), 1);
    }

    #[test]
    fn config_type_overrides_reach_formatter() {
        let mut config = bare_config();
        config.column_types.insert("integer".into(), "int".into());
        let pipeline = TablePipeline::new(Some(schema()), config, RecordingExecutor::new());
        assert!(pipeline.build().unwrap().text.contains("age int COMMENT"));
    }

    #[test]
    fn executor_failure_is_surfaced() {
        let pipeline = TablePipeline::new(
            Some(schema()),
            bare_config(),
            RecordingExecutor::rejecting("offline"),
        );
        assert!(matches!(pipeline.run(), Err(PipelineError::Execution(_))));
    }
}
