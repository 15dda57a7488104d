//! SQLite (3.25+) dialect adapter.
//!
//! SQLite cannot alter column types or drop constraints in place; those
//! operations are declined and surface as commented stanzas.

use laforge_schema::Dialect;

use super::{DialectAdapter, Rendered, column_def, create_table};
use crate::operation::SchemaOp;

/// Renders operations as SQLite DDL. Targets 3.25+, which has
/// `RENAME COLUMN`; older versions are out of scope.
pub struct SqliteAdapter;

impl DialectAdapter for SqliteAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn render(&self, op: &SchemaOp) -> Rendered {
        let dialect = self.dialect();
        let sql = match op {
            SchemaOp::AddTable { table, columns } => create_table(table, columns, dialect),
            SchemaOp::DropTable { table, .. } => format!("DROP TABLE {};", table),
            SchemaOp::RenameTable { from, to } => {
                format!("ALTER TABLE {} RENAME TO {};", from, to)
            }
            SchemaOp::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {};",
                table,
                column_def(column, dialect)
            ),
            SchemaOp::DropColumn { table, column } => {
                format!("ALTER TABLE {} DROP COLUMN {};", table, column.name)
            }
            SchemaOp::RenameColumn { table, from, to } => {
                format!("ALTER TABLE {} RENAME COLUMN {} TO {};", table, from, to)
            }
            SchemaOp::AlterColumnType { .. } => {
                return Rendered::Unsupported("SQLite cannot change a column's type in place");
            }
            SchemaOp::AlterNullability { .. } => {
                return Rendered::Unsupported("SQLite cannot change a column's nullability in place");
            }
            SchemaOp::AlterDefault { .. } => {
                return Rendered::Unsupported("SQLite cannot change a column's default in place");
            }
            SchemaOp::AddForeignKey { .. } => {
                return Rendered::Unsupported(
                    "SQLite cannot add a foreign key to an existing table",
                );
            }
            SchemaOp::DropForeignKey { .. } => {
                return Rendered::Unsupported("SQLite cannot drop a foreign key constraint");
            }
            SchemaOp::AlterForeignKey { .. } => {
                return Rendered::Unsupported("SQLite cannot alter a foreign key constraint");
            }
        };
        Rendered::Sql(sql)
    }
}
