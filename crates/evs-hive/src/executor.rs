//! # Query Executors
//!
//! The assembled statement is handed to a [`QueryExecutor`] exactly once.
//! Local implementations:
//!
//! - [`SqlFileExecutor`] writes `<output_dir>/<execution_id>.sql`.
//! - [`DryRunExecutor`] only logs the statement.
//! - `RecordingExecutor` keeps statements in memory for tests. It is only
//!   compiled for this crate's tests or with the `test-util` feature.

#[cfg(any(test, feature = "test-util"))]
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Reference to a submitted statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionHandle {
    /// Identifier of this execution.
    pub execution_id: Uuid,
    /// Where the result was written, if anywhere.
    pub output_location: Option<PathBuf>,
    /// When the executor accepted the statement.
    pub submitted_at: DateTime<Utc>,
}

impl ExecutionHandle {
    fn new(execution_id: Uuid, output_location: Option<PathBuf>) -> Self {
        Self {
            execution_id,
            output_location,
            submitted_at: Utc::now(),
        }
    }
}

/// Failure to submit a statement.
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The statement could not be written.
    #[error("statement output io error at {}: {source}", path.display())]
    Io {
        /// Directory or file that failed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The executor refused the statement.
    #[error("statement rejected: {0}")]
    Rejected(String),
}

/// Consumer of assembled statements.
pub trait QueryExecutor {
    /// Submit `statement`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] when the statement cannot be submitted.
    /// Callers do not retry.
    fn execute(&self, statement: &str) -> Result<ExecutionHandle, ExecutorError>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn execute(&self, statement: &str) -> Result<ExecutionHandle, ExecutorError> {
        (**self).execute(statement)
    }
}

/// Writes every statement to its own `.sql` file.
#[derive(Debug, Clone)]
pub struct SqlFileExecutor {
    output_dir: PathBuf,
}

impl SqlFileExecutor {
    /// Statements go under `output_dir`, created on first execute.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory receiving the `.sql` files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl QueryExecutor for SqlFileExecutor {
    fn execute(&self, statement: &str) -> Result<ExecutionHandle, ExecutorError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ExecutorError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let execution_id = Uuid::new_v4();
        let path = self.output_dir.join(format!("{execution_id}.sql"));
        let mut body = statement.to_string();
        body.push('\n');
        fs::write(&path, body).map_err(|source| ExecutorError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            execution_id = %execution_id,
            path = %path.display(),
            "statement written"
        );
        Ok(ExecutionHandle::new(execution_id, Some(path)))
    }
}

/// Logs the statement and does nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl QueryExecutor for DryRunExecutor {
    fn execute(&self, statement: &str) -> Result<ExecutionHandle, ExecutorError> {
        let handle = ExecutionHandle::new(Uuid::new_v4(), None);
        tracing::info!(
            execution_id = %handle.execution_id,
            statement,
            "dry run; statement not submitted"
        );
        Ok(handle)
    }
}

/// In-memory executor that records every statement.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: RefCell<Vec<String>>,
    reject_with: Option<String>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingExecutor {
    /// An executor that accepts and records every statement.
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that rejects every statement.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            statements: RefCell::default(),
            reject_with: Some(reason.into()),
        }
    }

    /// Accepted statements, in submission order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// Number of accepted statements.
    pub fn count(&self) -> usize {
        self.statements.borrow().len()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl QueryExecutor for RecordingExecutor {
    fn execute(&self, statement: &str) -> Result<ExecutionHandle, ExecutorError> {
        if let Some(reason) = &self.reject_with {
            return Err(ExecutorError::Rejected(reason.clone()));
        }
        self.statements.borrow_mut().push(statement.to_string());
        Ok(ExecutionHandle::new(Uuid::new_v4(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_file_is_named_after_execution_id() {
        let dir = tempfile::tempdir().unwrap();
        let executor = SqlFileExecutor::new(dir.path().join("out"));

        let handle = executor.execute("CREATE EXTERNAL TABLE IF NOT EXISTS d.t").unwrap();
        let path = handle.output_location.clone().unwrap();
        assert_eq!(
            path,
            dir.path().join("out").join(format!("{}.sql", handle.execution_id))
        );
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "CREATE EXTERNAL TABLE IF NOT EXISTS d.t\n"
        );
    }

    #[test]
    fn each_execution_gets_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let executor = SqlFileExecutor::new(dir.path());
        let a = executor.execute("a").unwrap();
        let b = executor.execute("b").unwrap();
        assert_ne!(a.execution_id, b.execution_id);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn dry_run_has_no_output() {
        let handle = DryRunExecutor.execute("SELECT 1").unwrap();
        assert!(handle.output_location.is_none());
    }

    #[test]
    fn recording_executor_keeps_statements() {
        let executor = RecordingExecutor::new();
        executor.execute("one").unwrap();
        assert_eq!(executor.statements(), vec!["one".to_string()]);

        let rejecting = RecordingExecutor::rejecting("offline");
        assert!(matches!(
            rejecting.execute("two"),
            Err(ExecutorError::Rejected(reason)) if reason == "offline"
        ));
        assert_eq!(rejecting.count(), 0);
    }
}
