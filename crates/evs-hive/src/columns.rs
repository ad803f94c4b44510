//! # Column Extraction & Formatting
//!
//! Turns the `properties` of a schema node into the column list of a Hive
//! table definition:
//!
//! ```text
//! eid varchar COMMENT 'An explanation',
//! address struct <street: varchar COMMENT 's',
//! number: tinyint COMMENT 'n'> COMMENT 'a'
//! ```
//!
//! Top-level columns use an empty name/type separator, struct members use
//! `:`. Unlike event validation, formatting is best-effort: a field whose
//! type cannot be resolved is logged, recorded and skipped, and the rest of
//! the table is still rendered.

use std::sync::OnceLock;

use indexmap::IndexMap;

use evs_core::{child_path, FieldKind, FieldSpec, SchemaError, SchemaNode, TypeMap, ROOT_PATH};

use crate::ddl::quote;

/// Ordered column name → field spec map, as fed to the formatter.
pub type ColumnMap = IndexMap<String, FieldSpec>;

/// Separator between name and type for top-level columns.
pub const TOP_LEVEL_SEPARATOR: &str = "";

/// Separator between name and type inside a `struct <...>`.
pub const STRUCT_SEPARATOR: &str = ":";

/// The default abstract-type → Hive column keyword map.
pub fn column_types() -> &'static TypeMap<String> {
    static COLUMN_TYPES: OnceLock<TypeMap<String>> = OnceLock::new();
    COLUMN_TYPES.get_or_init(|| {
        TypeMap::new([
            ("string", "varchar".to_string()),
            ("integer", "tinyint".to_string()),
            ("object", "struct".to_string()),
            ("boolean", "boolean".to_string()),
        ])
    })
}

/// Copy the columns of `schema`, optionally restricted to `filter`.
///
/// With `filter = None` or an empty filter every top-level property is
/// returned in declaration order. With a non-empty filter, only the named
/// columns are returned, in filter order. The schema itself is never
/// modified.
///
/// # Errors
///
/// Returns `MissingSchemaKey("properties")` when the root has no properties,
/// and `UnknownColumn` when the filter names an undeclared column.
pub fn columns(schema: &SchemaNode, filter: Option<&[String]>) -> Result<ColumnMap, SchemaError> {
    let properties = schema.properties(ROOT_PATH)?;

    let selected = match filter {
        Some(names) if !names.is_empty() => {
            let mut selected = ColumnMap::with_capacity(names.len());
            for name in names {
                let spec = properties.get(name).ok_or_else(|| SchemaError::UnknownColumn {
                    column: name.clone(),
                })?;
                selected.insert(name.clone(), spec.clone());
            }
            tracing::info!(columns = ?names, "column collection restricted to filter");
            selected
        }
        _ => properties.clone(),
    };

    tracing::info!(count = selected.len(), "collected schema columns");
    Ok(selected)
}

/// The table comment, taken from the root `description`.
pub fn table_comment(schema: &SchemaNode) -> Result<&str, SchemaError> {
    schema
        .description()
        .ok_or_else(|| SchemaError::missing_key("description", ROOT_PATH))
}

/// Rendered column text plus the field-level errors met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedColumns {
    /// Column definitions joined with `",\n"`.
    pub text: String,
    /// Fields that were skipped, in encounter order.
    pub errors: Vec<SchemaError>,
}

impl FormattedColumns {
    /// True when no column was rendered.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Renders column maps using a type map.
#[derive(Debug, Clone, Copy)]
pub struct ColumnFormatter<'m> {
    types: &'m TypeMap<String>,
}

impl Default for ColumnFormatter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnFormatter<'static> {
    /// A formatter using [`column_types`].
    pub fn new() -> Self {
        Self {
            types: column_types(),
        }
    }
}

impl<'m> ColumnFormatter<'m> {
    /// A formatter resolving declared types through `types`.
    pub fn with_types(types: &'m TypeMap<String>) -> Self {
        Self { types }
    }

    /// Render `fields` with `separator` between each name and its type.
    pub fn format(&self, fields: &ColumnMap, separator: &str) -> FormattedColumns {
        let mut errors = Vec::new();
        let text = self.format_level(fields, separator, ROOT_PATH, &mut errors);
        FormattedColumns { text, errors }
    }

    fn format_level(
        &self,
        fields: &ColumnMap,
        separator: &str,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) -> String {
        let mut rendered = Vec::with_capacity(fields.len());
        for (name, spec) in fields {
            let field_path = child_path(path, name);
            match self.format_field(name, spec, separator, &field_path, errors) {
                Ok(column) => rendered.push(column),
                Err(e) => {
                    tracing::error!(field = %field_path, error = %e, "column skipped");
                    errors.push(e);
                }
            }
        }
        rendered.join(",\n")
    }

    fn format_field(
        &self,
        name: &str,
        spec: &FieldSpec,
        separator: &str,
        path: &str,
        errors: &mut Vec<SchemaError>,
    ) -> Result<String, SchemaError> {
        let kind = spec.kind(path)?;
        let column_type = self.types.resolve(kind.type_name(), path)?;
        let mut column = format!("{name}{separator} {column_type}");

        if let FieldKind::Object(nested) = kind {
            let members = nested.properties(path)?;
            let inner = self.format_level(members, STRUCT_SEPARATOR, path, errors);
            column.push_str(&format!(" <{inner}>"));
        }

        if let Some(description) = spec.description() {
            column.push_str(&format!(" COMMENT {}", quote(description)));
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(fields: &[(&str, FieldSpec)]) -> ColumnMap {
        fields
            .iter()
            .map(|(name, spec)| (name.to_string(), spec.clone()))
            .collect()
    }

    #[test]
    fn scalar_column_with_comment() {
        let fields = cols(&[("age", FieldSpec::scalar("integer").with_description("d"))]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "age tinyint COMMENT 'd'");
        assert!(out.errors.is_empty());
    }

    #[test]
    fn column_without_description_has_no_comment() {
        let fields = cols(&[("flag", FieldSpec::scalar("boolean"))]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "flag boolean");
    }

    #[test]
    fn object_column_renders_struct_members() {
        let address = SchemaNode::new()
            .with_field("street", FieldSpec::scalar("string").with_description("s"))
            .with_field("number", FieldSpec::scalar("integer"));
        let fields = cols(&[
            ("name", FieldSpec::scalar("string")),
            ("address", FieldSpec::object(address).with_description("a")),
        ]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(
            out.text,
            "name varchar,\naddress struct <street: varchar COMMENT 's',\nnumber: tinyint> COMMENT 'a'"
        );
    }

    #[test]
    fn unknown_type_skips_only_that_field() {
        let fields = cols(&[
            ("price", FieldSpec::scalar("number")),
            ("name", FieldSpec::scalar("string")),
        ]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "name varchar");
        assert_eq!(out.errors, vec![SchemaError::unknown_type("number", "price")]);
    }

    #[test]
    fn missing_type_and_nested_properties_are_recorded() {
        let fields = cols(&[
            ("ghost", FieldSpec::untyped()),
            ("meta", FieldSpec::object(SchemaNode::new().without_properties())),
            ("ok", FieldSpec::scalar("boolean")),
        ]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "ok boolean");
        assert_eq!(
            out.errors,
            vec![
                SchemaError::missing_key("type", "ghost"),
                SchemaError::missing_key("properties", "meta"),
            ]
        );
    }

    #[test]
    fn nested_error_keeps_struct_siblings() {
        let inner = SchemaNode::new()
            .with_field("bad", FieldSpec::scalar("uuid"))
            .with_field("good", FieldSpec::scalar("string"));
        let fields = cols(&[("outer", FieldSpec::object(inner))]);
        let out = ColumnFormatter::new().format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "outer struct <good: varchar>");
        assert_eq!(out.errors, vec![SchemaError::unknown_type("uuid", "outer.bad")]);
    }

    #[test]
    fn override_map_changes_keywords() {
        let types = column_types().with_overrides([("integer", "int".to_string())]);
        let fields = cols(&[("age", FieldSpec::scalar("integer"))]);
        let out = ColumnFormatter::with_types(&types).format(&fields, TOP_LEVEL_SEPARATOR);
        assert_eq!(out.text, "age int");
    }

    #[test]
    fn filter_copies_selected_columns_in_filter_order() {
        let schema = SchemaNode::new()
            .with_field("a", FieldSpec::scalar("string"))
            .with_field("b", FieldSpec::scalar("integer"))
            .with_field("c", FieldSpec::scalar("boolean"));
        let before = schema.clone();

        let picked = columns(&schema, Some(&["c".to_string(), "a".to_string()])).unwrap();
        assert_eq!(picked.keys().collect::<Vec<_>>(), ["c", "a"]);
        assert_eq!(schema, before, "filtering must not touch the schema");

        let all = columns(&schema, None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn empty_filter_selects_every_column() {
        let schema = SchemaNode::new()
            .with_field("a", FieldSpec::scalar("string"))
            .with_field("b", FieldSpec::scalar("integer"));
        let picked = columns(&schema, Some(&[])).unwrap();
        assert_eq!(picked.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn filter_rejects_undeclared_column() {
        let schema = SchemaNode::new().with_field("a", FieldSpec::scalar("string"));
        let err = columns(&schema, Some(&["zzz".to_string()])).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownColumn {
                column: "zzz".into()
            }
        );
    }

    #[test]
    fn table_comment_requires_root_description() {
        let schema = SchemaNode::new();
        assert_eq!(
            table_comment(&schema).unwrap_err(),
            SchemaError::missing_key("description", ROOT_PATH)
        );
        assert_eq!(table_comment(&schema.with_description("t")).unwrap(), "t");
    }
}
