//! Per-dialect SQL rendering for schema operations.
//!
//! Each adapter turns a [`SchemaOp`] into a SQL statement, or declines it
//! as [`Rendered::Unsupported`] when the dialect cannot express it; the
//! emitter then comments the stanza out and records a warning.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use laforge_schema::{Dialect, ScalarType};

use crate::operation::{ColumnSpec, SchemaOp};

/// The outcome of rendering one operation for one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// A ready SQL statement (or statement pair).
    Sql(String),
    /// The dialect cannot express this operation.
    Unsupported(&'static str),
}

/// A dialect adapter: renders operations into dialect-specific SQL.
pub trait DialectAdapter: Sync {
    /// The dialect this adapter renders for.
    fn dialect(&self) -> Dialect;

    /// Render one operation.
    fn render(&self, op: &SchemaOp) -> Rendered;
}

/// Look up the adapter for a dialect.
pub fn adapter_for(dialect: Dialect) -> &'static dyn DialectAdapter {
    match dialect {
        Dialect::Postgres => &PostgresAdapter,
        Dialect::Mysql => &MysqlAdapter,
        Dialect::Sqlite => &SqliteAdapter,
    }
}

/// Render a default literal for a column type. String-like types are
/// quoted; integers pass through; booleans normalize to TRUE/FALSE.
pub(crate) fn default_literal(raw: &str, ty: ScalarType) -> String {
    match ty {
        ScalarType::Integer => raw.to_string(),
        ScalarType::Boolean => raw.to_uppercase(),
        _ => format!("'{}'", raw.replace('\'', "''")),
    }
}

/// Render a full column definition for CREATE TABLE / ADD COLUMN.
pub(crate) fn column_def(column: &ColumnSpec, dialect: Dialect) -> String {
    let mut def = format!("{} {}", column.name, dialect.column_type(column.ty));
    if column.primary_key {
        def.push_str(" PRIMARY KEY");
    } else if !column.optional {
        def.push_str(" NOT NULL");
    }
    if let Some(raw) = &column.default {
        def.push_str(&format!(" DEFAULT {}", default_literal(raw, column.ty)));
    }
    def
}

/// CREATE TABLE shared by all three dialects.
pub(crate) fn create_table(table: &str, columns: &[ColumnSpec], dialect: Dialect) -> String {
    let defs: Vec<String> = columns
        .iter()
        .map(|c| format!("  {}", column_def(c, dialect)))
        .collect();
    format!("CREATE TABLE {} (\n{}\n);", table, defs.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ForeignKeySpec;

    pub(crate) fn uuid_pk() -> ColumnSpec {
        ColumnSpec {
            name: "id".into(),
            ty: ScalarType::Uuid,
            optional: false,
            primary_key: true,
            default: None,
        }
    }

    pub(crate) fn plain(name: &str, ty: ScalarType) -> ColumnSpec {
        ColumnSpec {
            name: name.into(),
            ty,
            optional: false,
            primary_key: false,
            default: None,
        }
    }

    pub(crate) fn sample_fk() -> ForeignKeySpec {
        ForeignKeySpec {
            table: "users".into(),
            column: "team_id".into(),
            references_table: "teams".into(),
            references_column: "id".into(),
        }
    }

    #[test]
    fn test_default_literal_quoting() {
        assert_eq!(default_literal("active", ScalarType::String), "'active'");
        assert_eq!(default_literal("it's", ScalarType::Text), "'it''s'");
        assert_eq!(default_literal("0", ScalarType::Integer), "0");
        assert_eq!(default_literal("true", ScalarType::Boolean), "TRUE");
    }

    #[test]
    fn test_column_def_modifiers() {
        let def = column_def(&uuid_pk(), Dialect::Postgres);
        assert_eq!(def, "id UUID PRIMARY KEY");

        let mut bio = plain("bio", ScalarType::Text);
        bio.optional = true;
        assert_eq!(column_def(&bio, Dialect::Postgres), "bio TEXT");

        let mut status = plain("status", ScalarType::String);
        status.default = Some("active".into());
        assert_eq!(
            column_def(&status, Dialect::Postgres),
            "status VARCHAR(255) NOT NULL DEFAULT 'active'"
        );
    }

    #[test]
    fn test_create_table_layout() {
        let sql = create_table(
            "users",
            &[uuid_pk(), plain("email", ScalarType::String)],
            Dialect::Postgres,
        );
        assert_eq!(
            sql,
            "CREATE TABLE users (\n  id UUID PRIMARY KEY,\n  email VARCHAR(255) NOT NULL\n);"
        );
    }

    #[test]
    fn test_adapter_lookup() {
        assert_eq!(adapter_for(Dialect::Postgres).dialect(), Dialect::Postgres);
        assert_eq!(adapter_for(Dialect::Mysql).dialect(), Dialect::Mysql);
        assert_eq!(adapter_for(Dialect::Sqlite).dialect(), Dialect::Sqlite);
    }
}
