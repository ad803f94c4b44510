//! # DDL Subcommand
//!
//! Prints the `CREATE EXTERNAL TABLE` statement for a schema. With
//! `--out-dir` the statement is also written to `<out-dir>/<execution_id>.sql`;
//! otherwise it is a dry run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use evs_hive::{DryRunExecutor, QueryExecutor, SqlFileExecutor, TableConfig, TablePipeline};

use crate::{load_schema_or_none, resolve_path};

/// Arguments for the ddl subcommand.
#[derive(Args, Debug)]
pub struct DdlArgs {
    /// Schema file. Defaults to `schemas/event.schema.json`.
    #[arg(long, env = "EVS_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// YAML table configuration. Built-in defaults apply without it.
    #[arg(long)]
    pub table_config: Option<PathBuf>,

    /// Write the statement as a `.sql` file into this directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

/// Load the table config named by `path`, or the defaults.
pub fn load_table_config(path: Option<&Path>, repo_root: &Path) -> Result<TableConfig> {
    match path {
        Some(path) => {
            let path = resolve_path(path, repo_root);
            TableConfig::from_yaml_file(&path)
                .with_context(|| format!("invalid table config {}", path.display()))
        }
        None => Ok(TableConfig::default()),
    }
}

/// Run the ddl subcommand.
pub fn run_ddl(args: &DdlArgs, repo_root: &Path) -> Result<u8> {
    let config = load_table_config(args.table_config.as_deref(), repo_root)?;
    let schema = load_schema_or_none(args.schema.as_deref(), repo_root);

    match &args.out_dir {
        Some(dir) => execute(TablePipeline::new(schema, config, SqlFileExecutor::new(dir))),
        None => execute(TablePipeline::new(schema, config, DryRunExecutor)),
    }
}

fn execute<E: QueryExecutor>(pipeline: TablePipeline<E>) -> Result<u8> {
    let output = pipeline.run()?;

    for warning in &output.statement.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &output.statement.column_errors {
        eprintln!("warning: skipped: {error}");
    }

    println!("{}", output.statement);
    if let Some(path) = &output.handle.output_location {
        eprintln!("  wrote: {}", path.display());
    }
    Ok(0)
}
