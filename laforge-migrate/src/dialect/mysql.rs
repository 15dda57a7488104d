//! MySQL (8.0+) dialect adapter.

use laforge_schema::Dialect;

use super::{DialectAdapter, Rendered, column_def, create_table, default_literal};
use crate::operation::SchemaOp;

/// Renders operations as MySQL DDL. Targets 8.0+, which has
/// `RENAME COLUMN`; older servers are out of scope.
pub struct MysqlAdapter;

impl DialectAdapter for MysqlAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn render(&self, op: &SchemaOp) -> Rendered {
        let dialect = self.dialect();
        let sql = match op {
            SchemaOp::AddTable { table, columns } => create_table(table, columns, dialect),
            SchemaOp::DropTable { table, .. } => format!("DROP TABLE {};", table),
            SchemaOp::RenameTable { from, to } => format!("RENAME TABLE {} TO {};", from, to),
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
            SchemaOp::AlterColumnType {
                table,
                column,
                to_ty,
                ..
            } => format!(
                "ALTER TABLE {} MODIFY {} {};",
                table,
                column,
                dialect.column_type(*to_ty)
            ),
            SchemaOp::AlterNullability {
                table,
                column,
                ty,
                nullable,
            } => {
                // MODIFY restates the whole column definition
                let null_clause = if *nullable { "NULL" } else { "NOT NULL" };
                format!(
                    "ALTER TABLE {} MODIFY {} {} {};",
                    table,
                    column,
                    dialect.column_type(*ty),
                    null_clause
                )
            }
            SchemaOp::AlterDefault {
                table,
                column,
                ty,
                to,
            } => match to {
                Some(raw) => format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    table,
                    column,
                    default_literal(raw, *ty)
                ),
                None => format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;", table, column),
            },
            SchemaOp::AddForeignKey { fk } => format!(
                "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
                fk.table,
                fk.constraint_name(),
                fk.column,
                fk.references_table,
                fk.references_column
            ),
            SchemaOp::DropForeignKey { fk } => format!(
                "ALTER TABLE {} DROP FOREIGN KEY {};",
                fk.table,
                fk.constraint_name()
            ),
            SchemaOp::AlterForeignKey { from, to } => format!(
                "ALTER TABLE {} DROP FOREIGN KEY {};\nALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
                from.table,
                from.constraint_name(),
                to.table,
                to.constraint_name(),
                to.column,
                to.references_table,
                to.references_column
            ),
        };
        Rendered::Sql(sql)
    }
}
