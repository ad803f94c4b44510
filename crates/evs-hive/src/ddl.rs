//! # CREATE EXTERNAL TABLE Assembly
//!
//! A [`DdlSpec`] describes the table; [`assemble`] renders it. Every clause
//! has its own builder returning `Option<String>`, and the statement is the
//! `"\n"`-joined concatenation of the present clauses in this fixed order:
//!
//! | # | Clause                                     | Input                      |
//! |---|--------------------------------------------|----------------------------|
//! | 1 | `CREATE EXTERNAL TABLE IF NOT EXISTS d.t`  | always                     |
//! | 2 | `(<columns>)`                              | `columns`                  |
//! | 3 | `COMMENT '<text>'`                         | `comment`                  |
//! | 4 | `PARTITIONED BY (<columns>)`               | `partition_columns`        |
//! | 5 | `CLUSTERED BY (a,b) INTO n BUCKETS`        | `clustering` + `num_buckets` |
//! | 6 | `ROW FORMAT '<serde>'`                     | `row_format`               |
//! | 7 | `STORED AS <format>`                       | `file_format`              |
//! | 8 | `WITH SERDEPROPERTIES ('k' = 'v',...)`     | `serde_properties`         |
//! | 9 | `LOCATION '<path>'`                        | `location`                 |
//! |10 | `TBLPROPERTIES ('k' = 'v',...)`            | `tbl_properties`           |
//!
//! Empty collections and empty strings count as absent.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use evs_core::SchemaError;

use crate::columns::{ColumnFormatter, ColumnMap, TOP_LEVEL_SEPARATOR};

/// Ordered `key → value` table or serde properties.
pub type PropertyMap = IndexMap<String, Value>;

/// Non-fatal problem found while assembling a statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DdlWarning {
    /// Only one of clustering columns and bucket count was given.
    #[error(
        "clustering needs both columns and a bucket count (columns: {columns:?}, buckets: {num_buckets:?}); clause skipped"
    )]
    ClusteringConfigIncomplete {
        /// Clustering columns as given.
        columns: Vec<String>,
        /// Bucket count as given.
        num_buckets: Option<u32>,
    },
}

/// Everything that goes into one `CREATE EXTERNAL TABLE` statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DdlSpec {
    /// Database part of the qualified name.
    pub database: String,
    /// Table part of the qualified name.
    pub table: String,
    /// Table columns, in output order.
    pub columns: ColumnMap,
    /// Table comment.
    pub comment: Option<String>,
    /// Columns for `PARTITIONED BY`, in output order.
    pub partition_columns: ColumnMap,
    /// Columns for `CLUSTERED BY`.
    pub clustering_columns: Vec<String>,
    /// Bucket count for `CLUSTERED BY`. Zero counts as absent.
    pub num_buckets: Option<u32>,
    /// SerDe class for `ROW FORMAT`.
    pub row_format: Option<String>,
    /// Keyword for `STORED AS`.
    pub file_format: Option<String>,
    /// `WITH SERDEPROPERTIES` entries.
    pub serde_properties: PropertyMap,
    /// Storage URI for `LOCATION`.
    pub location: Option<String>,
    /// `TBLPROPERTIES` entries.
    pub tbl_properties: PropertyMap,
}

impl DdlSpec {
    /// A bare spec for `database.table`.
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            ..Self::default()
        }
    }

    /// Set the table columns.
    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = columns;
        self
    }

    /// Set the table comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the partition columns.
    pub fn with_partition_columns(mut self, columns: ColumnMap) -> Self {
        self.partition_columns = columns;
        self
    }

    /// Set clustering columns and bucket count together.
    pub fn with_clustering(mut self, columns: Vec<String>, num_buckets: Option<u32>) -> Self {
        self.clustering_columns = columns;
        self.num_buckets = num_buckets;
        self
    }

    /// Set the `ROW FORMAT` SerDe class.
    pub fn with_row_format(mut self, row_format: impl Into<String>) -> Self {
        self.row_format = Some(row_format.into());
        self
    }

    /// Set the `STORED AS` keyword.
    pub fn with_file_format(mut self, file_format: impl Into<String>) -> Self {
        self.file_format = Some(file_format.into());
        self
    }

    /// Set the SerDe properties.
    pub fn with_serde_properties(mut self, properties: PropertyMap) -> Self {
        self.serde_properties = properties;
        self
    }

    /// Set the storage location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the table properties.
    pub fn with_tbl_properties(mut self, properties: PropertyMap) -> Self {
        self.tbl_properties = properties;
        self
    }
}

/// A rendered statement with the problems met while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DdlStatement {
    /// Statement text.
    pub text: String,
    /// Skipped clauses.
    pub warnings: Vec<DdlWarning>,
    /// Columns the formatter skipped, table and partition columns alike.
    pub column_errors: Vec<SchemaError>,
    /// Names of the rendered clauses, in statement order.
    pub clauses: Vec<&'static str>,
}

impl DdlStatement {
    /// True when every clause and column was rendered.
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty() && self.column_errors.is_empty()
    }
}

impl fmt::Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Wrap `text` in single quotes, escaping backslashes and quotes.
pub fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Text form of a property value: booleans as `True`/`False`, null as
/// `None`, strings as-is, everything else as compact JSON.
pub fn property_text(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `'k' = 'v'` pairs joined with `","`.
pub fn property_list(properties: &PropertyMap) -> String {
    properties
        .iter()
        .map(|(key, value)| format!("{} = {}", quote(key), quote(&property_text(value))))
        .collect::<Vec<_>>()
        .join(",")
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// `CREATE EXTERNAL TABLE IF NOT EXISTS database.table`.
pub fn create_clause(database: &str, table: &str) -> String {
    format!("CREATE EXTERNAL TABLE IF NOT EXISTS {database}.{table}")
}

/// `(<columns>)`, or nothing when no column was rendered.
pub fn columns_clause(columns: &str) -> Option<String> {
    (!columns.is_empty()).then(|| format!("({columns})"))
}

/// `COMMENT '<text>'`.
pub fn comment_clause(comment: Option<&str>) -> Option<String> {
    comment
        .filter(|c| !c.is_empty())
        .map(|c| format!("COMMENT {}", quote(c)))
}

/// `PARTITIONED BY (<columns>)`, or nothing when no column was rendered.
pub fn partition_clause(columns: &str) -> Option<String> {
    (!columns.is_empty()).then(|| format!("PARTITIONED BY ({columns})"))
}

/// `CLUSTERED BY` needs both inputs. With neither it is simply absent; with
/// only one it is skipped and reported.
pub fn clustering_clause(
    columns: &[String],
    num_buckets: Option<u32>,
) -> Result<Option<String>, DdlWarning> {
    let buckets = num_buckets.filter(|n| *n > 0);
    match (columns.is_empty(), buckets) {
        (true, None) => Ok(None),
        (false, Some(n)) => Ok(Some(format!(
            "CLUSTERED BY ({}) INTO {n} BUCKETS",
            columns.join(",")
        ))),
        _ => Err(DdlWarning::ClusteringConfigIncomplete {
            columns: columns.to_vec(),
            num_buckets,
        }),
    }
}

/// `ROW FORMAT '<serde>'`.
pub fn row_format_clause(row_format: Option<&str>) -> Option<String> {
    row_format
        .filter(|r| !r.is_empty())
        .map(|r| format!("ROW FORMAT {}", quote(r)))
}

/// `STORED AS <format>`, unquoted.
pub fn stored_as_clause(file_format: Option<&str>) -> Option<String> {
    file_format
        .filter(|f| !f.is_empty())
        .map(|f| format!("STORED AS {f}"))
}

/// `WITH SERDEPROPERTIES ('k' = 'v',...)`.
pub fn serde_properties_clause(properties: &PropertyMap) -> Option<String> {
    (!properties.is_empty())
        .then(|| format!("WITH SERDEPROPERTIES ({})", property_list(properties)))
}

/// `LOCATION '<path>'`.
pub fn location_clause(location: Option<&str>) -> Option<String> {
    location
        .filter(|l| !l.is_empty())
        .map(|l| format!("LOCATION {}", quote(l)))
}

/// `TBLPROPERTIES ('k' = 'v',...)`.
pub fn tbl_properties_clause(properties: &PropertyMap) -> Option<String> {
    (!properties.is_empty()).then(|| format!("TBLPROPERTIES ({})", property_list(properties)))
}

/// Render `spec` into a statement, formatting columns with `formatter`.
pub fn assemble(spec: &DdlSpec, formatter: &ColumnFormatter<'_>) -> DdlStatement {
    let mut warnings = Vec::new();
    let mut column_errors = Vec::new();

    let columns = formatter.format(&spec.columns, TOP_LEVEL_SEPARATOR);
    column_errors.extend(columns.errors);
    let partitions = formatter.format(&spec.partition_columns, TOP_LEVEL_SEPARATOR);
    column_errors.extend(partitions.errors);

    let clustering = clustering_clause(&spec.clustering_columns, spec.num_buckets)
        .unwrap_or_else(|warning| {
            tracing::warn!(%warning, "clustering clause skipped");
            warnings.push(warning);
            None
        });

    let candidates = [
        ("create", Some(create_clause(&spec.database, &spec.table))),
        ("columns", columns_clause(&columns.text)),
        ("comment", comment_clause(present(&spec.comment))),
        ("partitioned_by", partition_clause(&partitions.text)),
        ("clustered_by", clustering),
        ("row_format", row_format_clause(present(&spec.row_format))),
        ("stored_as", stored_as_clause(present(&spec.file_format))),
        ("serde_properties", serde_properties_clause(&spec.serde_properties)),
        ("location", location_clause(present(&spec.location))),
        ("tbl_properties", tbl_properties_clause(&spec.tbl_properties)),
    ];

    let mut clauses = Vec::with_capacity(candidates.len());
    let mut parts = Vec::with_capacity(candidates.len());
    for (name, clause) in candidates {
        if let Some(clause) = clause {
            tracing::info!(clause = name, "clause included");
            clauses.push(name);
            parts.push(clause);
        }
    }
    let text = parts.join("\n");

    tracing::info!(
        database = %spec.database,
        table = %spec.table,
        clauses = clauses.len(),
        warnings = warnings.len(),
        column_errors = column_errors.len(),
        "create table statement assembled"
    );
    tracing::debug!(statement = %text, "assembled statement text");

    DdlStatement {
        text,
        warnings,
        column_errors,
        clauses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evs_core::FieldSpec;
    use serde_json::json;

    const BARE: &str = "CREATE EXTERNAL TABLE IF NOT EXISTS db_people.tb_user";

    fn spec() -> DdlSpec {
        DdlSpec::new("db_people", "tb_user")
    }

    fn props(value: Value) -> PropertyMap {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn bare_spec_renders_create_line_only() {
        let statement = assemble(&spec(), &ColumnFormatter::new());
        assert_eq!(statement.text, BARE);
        assert!(statement.is_complete());
    }

    #[test]
    fn statement_lists_rendered_clauses() {
        let statement = assemble(
            &spec()
                .with_location("s3://bucket/")
                .with_file_format("ORC")
                .with_comment("people"),
            &ColumnFormatter::new(),
        );
        assert_eq!(statement.clauses, ["create", "comment", "stored_as", "location"]);
        assert_eq!(assemble(&spec(), &ColumnFormatter::new()).clauses, ["create"]);
    }

    #[test]
    fn clauses_keep_fixed_order() {
        let statement = assemble(
            &spec()
                .with_location("s3://bucket/")
                .with_file_format("ORC")
                .with_comment("people"),
            &ColumnFormatter::new(),
        );
        assert_eq!(
            statement.text,
            format!("{BARE}\nCOMMENT 'people'\nSTORED AS ORC\nLOCATION 's3://bucket/'")
        );
    }

    #[test]
    fn empty_inputs_count_as_absent() {
        let statement = assemble(
            &spec()
                .with_comment("")
                .with_row_format("")
                .with_clustering(Vec::new(), None),
            &ColumnFormatter::new(),
        );
        assert_eq!(statement.text, BARE);
        assert!(statement.warnings.is_empty());
    }

    #[test]
    fn clustering_without_buckets_warns() {
        let statement = assemble(
            &spec().with_clustering(vec!["age".into()], None),
            &ColumnFormatter::new(),
        );
        assert_eq!(statement.text, BARE);
        assert_eq!(
            statement.warnings,
            vec![DdlWarning::ClusteringConfigIncomplete {
                columns: vec!["age".into()],
                num_buckets: None,
            }]
        );
    }

    #[test]
    fn buckets_without_columns_warns() {
        let statement = assemble(
            &spec().with_clustering(Vec::new(), Some(8)),
            &ColumnFormatter::new(),
        );
        assert_eq!(statement.text, BARE);
        assert_eq!(statement.warnings.len(), 1);
    }

    #[test]
    fn clustering_joins_columns_with_comma() {
        let clause = clustering_clause(&["a".to_string(), "b".to_string()], Some(4)).unwrap();
        assert_eq!(clause.as_deref(), Some("CLUSTERED BY (a,b) INTO 4 BUCKETS"));
    }

    #[test]
    fn property_values_render_like_literals() {
        assert_eq!(property_text(&json!(true)), "True");
        assert_eq!(property_text(&json!(false)), "False");
        assert_eq!(property_text(&Value::Null), "None");
        assert_eq!(property_text(&json!("SNAPPY")), "SNAPPY");
        assert_eq!(property_text(&json!(12)), "12");
    }

    #[test]
    fn property_list_keeps_insertion_order() {
        let list = property_list(&props(json!({"z": 1, "a": "x"})));
        assert_eq!(list, "'z' = '1','a' = 'x'");
    }

    #[test]
    fn quote_escapes_embedded_quotes() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"a\b"), r"'a\\b'");
    }

    #[test]
    fn column_errors_are_collected_from_both_column_lists() {
        let mut columns = ColumnMap::new();
        columns.insert("price".into(), FieldSpec::scalar("number"));
        let mut partitions = ColumnMap::new();
        partitions.insert("when".into(), FieldSpec::scalar("date"));

        let statement = assemble(
            &spec()
                .with_columns(columns)
                .with_partition_columns(partitions),
            &ColumnFormatter::new(),
        );
        assert_eq!(statement.text, BARE);
        assert_eq!(statement.column_errors.len(), 2);
        assert!(!statement.is_complete());
    }
}
