//! # Table Configuration
//!
//! Everything about the target table that does not come from the schema.
//! Loaded from YAML; every key is optional and falls back to the reference
//! deployment (`db_people.tb_user`, Parquet with SNAPPY compression,
//! clustered by `age` into 32 buckets).
//!
//! ```yaml
//! database: db_people
//! table: tb_user
//! partition_columns: []   # every column; `null` disables partitioning
//! clustering_columns: [age]
//! num_buckets: 32
//! column_types:
//!   integer: int
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use evs_core::TypeMap;

use crate::columns::column_types;
use crate::ddl::PropertyMap;

/// Database of the reference table.
pub const DEFAULT_DATABASE: &str = "db_people";
/// Name of the reference table.
pub const DEFAULT_TABLE: &str = "tb_user";
/// Bucket count used with the default clustering on `age`.
pub const DEFAULT_NUM_BUCKETS: u32 = 32;
/// SerDe class for Parquet-backed tables.
pub const DEFAULT_ROW_FORMAT: &str = "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe";
/// `STORED AS` keyword.
pub const DEFAULT_FILE_FORMAT: &str = "PARQUET";
/// Query result bucket the table points at.
pub const DEFAULT_LOCATION: &str = "s3://iti-query-results/";

/// Failure to load a [`TableConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The source could not be read or parsed.
    #[error("failed to load table config from {path}: {reason}")]
    Load {
        /// File path, or a label for in-memory sources.
        path: String,
        /// Human-readable cause.
        reason: String,
    },
}

/// Table-level settings for DDL generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Target database.
    pub database: String,
    /// Target table within `database`.
    pub table: String,
    /// Schema columns to partition by.
    ///
    /// `None` omits `PARTITIONED BY`. An empty list partitions by every
    /// schema column; a non-empty list selects those columns in list order.
    pub partition_columns: Option<Vec<String>>,
    /// Columns for `CLUSTERED BY`. Empty omits the clause.
    pub clustering_columns: Vec<String>,
    /// Bucket count for `CLUSTERED BY ... INTO n BUCKETS`.
    pub num_buckets: Option<u32>,
    /// SerDe class for `ROW FORMAT SERDE`.
    pub row_format: Option<String>,
    /// Keyword for `STORED AS`.
    pub file_format: Option<String>,
    /// `WITH SERDEPROPERTIES` entries, in order.
    pub serde_properties: PropertyMap,
    /// Storage URI for `LOCATION`.
    pub location: Option<String>,
    /// `TBLPROPERTIES` entries, in order.
    pub tbl_properties: PropertyMap,
    /// Abstract type → column keyword overrides, merged over the defaults.
    pub column_types: IndexMap<String, String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        let serde_properties = [
            ("parquet.compress", Value::from("SNAPPY")),
            ("serialization.format", Value::from("1")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let tbl_properties = [("has_encrypted_data".to_string(), Value::Bool(true))]
            .into_iter()
            .collect();

        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            partition_columns: Some(Vec::new()),
            clustering_columns: vec!["age".to_string()],
            num_buckets: Some(DEFAULT_NUM_BUCKETS),
            row_format: Some(DEFAULT_ROW_FORMAT.to_string()),
            file_format: Some(DEFAULT_FILE_FORMAT.to_string()),
            serde_properties,
            location: Some(DEFAULT_LOCATION.to_string()),
            tbl_properties,
            column_types: IndexMap::new(),
        }
    }
}

impl TableConfig {
    /// Parse a config from YAML text. `source` names the origin in errors.
    pub fn from_yaml_str(content: &str, source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load {
            path: source.to_string(),
            reason: format!("invalid YAML: {e}"),
        })
    }

    /// Load a config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when the file cannot be read, is not
    /// YAML, or contains unknown keys.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Load {
            path: path.display().to_string(),
            reason: format!("cannot read file: {e}"),
        })?;
        let config = Self::from_yaml_str(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            table = %config.qualified_name(),
            "table config loaded"
        );
        Ok(config)
    }

    /// `database.table`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }

    /// The default column type map with this config's overrides applied.
    pub fn column_types(&self) -> TypeMap<String> {
        column_types().with_overrides(
            self.column_types
                .iter()
                .map(|(name, keyword)| (name.clone(), keyword.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = TableConfig::default();
        assert_eq!(config.qualified_name(), "db_people.tb_user");
        assert_eq!(config.clustering_columns, vec!["age".to_string()]);
        assert_eq!(config.num_buckets, Some(32));
        assert_eq!(config.partition_columns, Some(Vec::new()));
        assert_eq!(config.tbl_properties["has_encrypted_data"], Value::Bool(true));
        assert_eq!(
            config.serde_properties.keys().collect::<Vec<_>>(),
            ["parquet.compress", "serialization.format"]
        );
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config =
            TableConfig::from_yaml_str("table: tb_orders\nnum_buckets: 8\n", "inline").unwrap();
        assert_eq!(config.qualified_name(), "db_people.tb_orders");
        assert_eq!(config.num_buckets, Some(8));
        assert_eq!(config.file_format.as_deref(), Some("PARQUET"));
    }

    #[test]
    fn null_partition_columns_disable_partitioning() {
        let config = TableConfig::from_yaml_str("partition_columns: null\n", "inline").unwrap();
        assert_eq!(config.partition_columns, None);

        let config = TableConfig::from_yaml_str("partition_columns: [age]\n", "inline").unwrap();
        assert_eq!(config.partition_columns, Some(vec!["age".to_string()]));
    }

    #[test]
    fn yaml_scalars_become_property_values() {
        let yaml = "tbl_properties:\n  has_encrypted_data: false\n  retention: 30\n";
        let config = TableConfig::from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(config.tbl_properties["has_encrypted_data"], Value::Bool(false));
        assert_eq!(config.tbl_properties["retention"], Value::from(30));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = TableConfig::from_yaml_str("tabel: typo\n", "inline").unwrap_err();
        assert!(err.to_string().contains("inline"), "{err}");
    }

    #[test]
    fn column_type_overrides_merge_over_defaults() {
        let config =
            TableConfig::from_yaml_str("column_types:\n  integer: int\n", "inline").unwrap();
        let types = config.column_types();
        assert_eq!(types.resolve("integer", "age").unwrap(), "int");
        assert_eq!(types.resolve("string", "name").unwrap(), "varchar");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TableConfig::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("cannot read file"), "{err}");
    }
}
