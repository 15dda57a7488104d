//! PostgreSQL dialect adapter.

use laforge_schema::Dialect;

use super::{DialectAdapter, Rendered, column_def, create_table, default_literal};
use crate::operation::SchemaOp;

/// Renders operations as PostgreSQL DDL.
pub struct PostgresAdapter;

impl DialectAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
            SchemaOp::AlterColumnType {
                table,
                column,
                to_ty,
                ..
            } => {
                let ty = dialect.column_type(*to_ty);
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                    table, column, ty, column, ty
                )
            }
            SchemaOp::AlterNullability {
                table,
                column,
                nullable,
                ..
            } => {
                let clause = if *nullable {
                    "DROP NOT NULL"
                } else {
                    "SET NOT NULL"
                };
                format!("ALTER TABLE {} ALTER COLUMN {} {};", table, column, clause)
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
                "ALTER TABLE {} DROP CONSTRAINT {};",
                fk.table,
                fk.constraint_name()
            ),
            SchemaOp::AlterForeignKey { from, to } => format!(
                "ALTER TABLE {} DROP CONSTRAINT {};\nALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
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

#[cfg(test)]
mod tests {
    use super::super::tests::{plain, sample_fk, uuid_pk};
    use super::*;
    use laforge_schema::ScalarType;

    fn render(op: &SchemaOp) -> String {
        match PostgresAdapter.render(op) {
            Rendered::Sql(sql) => sql,
            Rendered::Unsupported(reason) => panic!("unexpectedly unsupported: {}", reason),
        }
    }

    #[test]
    fn test_add_table() {
        let sql = render(&SchemaOp::AddTable {
            table: "users".into(),
            columns: vec![uuid_pk(), plain("email", ScalarType::String)],
        });
        assert!(sql.starts_with("CREATE TABLE users ("));
        assert!(sql.contains("id UUID PRIMARY KEY"));
    }

    #[test]
    fn test_alter_type_uses_using_clause() {
        let sql = render(&SchemaOp::AlterColumnType {
            table: "users".into(),
            column: "email".into(),
            from_ty: ScalarType::String,
            to_ty: ScalarType::Integer,
        });
        assert_eq!(
            sql,
            "ALTER TABLE users ALTER COLUMN email TYPE INTEGER USING email::INTEGER;"
        );
    }

    #[test]
    fn test_nullability() {
        let sql = render(&SchemaOp::AlterNullability {
            table: "users".into(),
            column: "bio".into(),
            ty: ScalarType::Text,
            nullable: true,
        });
        assert_eq!(sql, "ALTER TABLE users ALTER COLUMN bio DROP NOT NULL;");
    }

    #[test]
    fn test_drop_fk_uses_drop_constraint() {
        let sql = render(&SchemaOp::DropForeignKey { fk: sample_fk() });
        assert_eq!(sql, "ALTER TABLE users DROP CONSTRAINT fk_users_team_id;");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let op = SchemaOp::AddForeignKey { fk: sample_fk() };
        assert_eq!(render(&op), render(&op));
        assert!(render(&op).contains("fk_users_team_id"));
    }
}
