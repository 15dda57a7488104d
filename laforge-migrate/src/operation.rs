//! The closed set of schema operations produced by the differ.

use laforge_schema::{Field, Model, ScalarType, names};

/// A column definition carried by table and column operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name (snake case).
    pub name: String,
    /// Scalar type.
    pub ty: ScalarType,
    /// Nullability.
    pub optional: bool,
    /// Primary key flag.
    pub primary_key: bool,
    /// Raw default literal, if any.
    pub default: Option<String>,
}

impl ColumnSpec {
    /// Build a column spec from a model field.
    pub fn from_field(field: &Field) -> Self {
        Self {
            name: names::column_name(field.name()),
            ty: field.ty,
            optional: field.optional,
            primary_key: field.primary_key,
            default: field.default.as_ref().map(|d| d.to_string()),
        }
    }
}

/// A foreign key derived from a belongsTo relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    /// Owning table.
    pub table: String,
    /// Foreign key column on the owning table.
    pub column: String,
    /// Referenced table.
    pub references_table: String,
    /// Referenced column (the target's primary key).
    pub references_column: String,
}

impl ForeignKeySpec {
    /// Stable constraint name: `fk_<table>_<column>`.
    pub fn constraint_name(&self) -> String {
        names::constraint_name(&self.table, &self.column)
    }
}

/// One element of the ordered operation sequence between two domains.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaOp {
    /// Create a table with its columns.
    AddTable {
        table: String,
        columns: Vec<ColumnSpec>,
    },
    /// Drop a table. Columns are carried for the fallback stanza.
    DropTable {
        table: String,
        columns: Vec<ColumnSpec>,
    },
    /// Rename a table.
    RenameTable { from: String, to: String },
    /// Add a column to an existing table.
    AddColumn { table: String, column: ColumnSpec },
    /// Drop a column.
    DropColumn { table: String, column: ColumnSpec },
    /// Rename a column.
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    /// Change a column's type.
    AlterColumnType {
        table: String,
        column: String,
        from_ty: ScalarType,
        to_ty: ScalarType,
    },
    /// Change a column's nullability. The type rides along because some
    /// dialects re-state the full column definition.
    AlterNullability {
        table: String,
        column: String,
        ty: ScalarType,
        nullable: bool,
    },
    /// Change or clear a column's default.
    AlterDefault {
        table: String,
        column: String,
        ty: ScalarType,
        to: Option<String>,
    },
    /// Add a foreign key constraint.
    AddForeignKey { fk: ForeignKeySpec },
    /// Drop a foreign key constraint.
    DropForeignKey { fk: ForeignKeySpec },
    /// Re-point a foreign key constraint.
    AlterForeignKey {
        from: ForeignKeySpec,
        to: ForeignKeySpec,
    },
}

impl SchemaOp {
    /// The operation kind name, as used in warnings and comments.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::AddTable { .. } => "addTable",
            Self::DropTable { .. } => "dropTable",
            Self::RenameTable { .. } => "renameTable",
            Self::AddColumn { .. } => "addColumn",
            Self::DropColumn { .. } => "dropColumn",
            Self::RenameColumn { .. } => "renameColumn",
            Self::AlterColumnType { .. } => "alterColumnType",
            Self::AlterNullability { .. } => "alterNullability",
            Self::AlterDefault { .. } => "alterDefault",
            Self::AddForeignKey { .. } => "addForeignKey",
            Self::DropForeignKey { .. } => "dropForeignKey",
            Self::AlterForeignKey { .. } => "alterForeignKey",
        }
    }

    /// Whether applying this operation can lose data.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::DropTable { .. }
                | Self::DropColumn { .. }
                | Self::DropForeignKey { .. }
                | Self::AlterColumnType { .. }
        )
    }

    /// A short human-readable description for warnings.
    pub fn describe(&self) -> String {
        match self {
            Self::AddTable { table, .. } => format!("addTable {}", table),
            Self::DropTable { table, .. } => format!("dropTable {}", table),
            Self::RenameTable { from, to } => format!("renameTable {} -> {}", from, to),
            Self::AddColumn { table, column } => format!("addColumn {}.{}", table, column.name),
            Self::DropColumn { table, column } => format!("dropColumn {}.{}", table, column.name),
            Self::RenameColumn { table, from, to } => {
                format!("renameColumn {}.{} -> {}", table, from, to)
            }
            Self::AlterColumnType {
                table,
                column,
                from_ty,
                to_ty,
            } => format!(
                "alterColumnType {}.{} {} -> {}",
                table, column, from_ty, to_ty
            ),
            Self::AlterNullability {
                table,
                column,
                nullable,
                ..
            } => format!(
                "alterNullability {}.{} -> {}",
                table,
                column,
                if *nullable { "null" } else { "not_null" }
            ),
            Self::AlterDefault { table, column, to, .. } => match to {
                Some(value) => format!("alterDefault {}.{} -> {}", table, column, value),
                None => format!("alterDefault {}.{} -> none", table, column),
            },
            Self::AddForeignKey { fk } => format!("addForeignKey {}", fk.constraint_name()),
            Self::DropForeignKey { fk } => format!("dropForeignKey {}", fk.constraint_name()),
            Self::AlterForeignKey { from, .. } => {
                format!("alterForeignKey {}", from.constraint_name())
            }
        }
    }

    /// The table this operation touches, used for deterministic ordering.
    pub fn table(&self) -> &str {
        match self {
            Self::AddTable { table, .. }
            | Self::DropTable { table, .. }
            | Self::AddColumn { table, .. }
            | Self::DropColumn { table, .. }
            | Self::RenameColumn { table, .. }
            | Self::AlterColumnType { table, .. }
            | Self::AlterNullability { table, .. }
            | Self::AlterDefault { table, .. } => table,
            Self::RenameTable { to, .. } => to,
            Self::AddForeignKey { fk } | Self::DropForeignKey { fk } => &fk.table,
            Self::AlterForeignKey { to, .. } => &to.table,
        }
    }
}

/// Build the column list for a model, in declaration order.
pub fn columns_of(model: &Model) -> Vec<ColumnSpec> {
    model.fields.values().map(ColumnSpec::from_field).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, ty: ScalarType) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            ty,
            optional: false,
            primary_key: false,
            default: None,
        }
    }

    #[test]
    fn test_destructive_classification() {
        let fk = ForeignKeySpec {
            table: "users".into(),
            column: "team_id".into(),
            references_table: "teams".into(),
            references_column: "id".into(),
        };

        assert!(
            SchemaOp::DropTable {
                table: "users".into(),
                columns: vec![]
            }
            .is_destructive()
        );
        assert!(
            SchemaOp::DropColumn {
                table: "users".into(),
                column: spec("email", ScalarType::String)
            }
            .is_destructive()
        );
        assert!(SchemaOp::DropForeignKey { fk: fk.clone() }.is_destructive());
        assert!(
            SchemaOp::AlterColumnType {
                table: "users".into(),
                column: "email".into(),
                from_ty: ScalarType::String,
                to_ty: ScalarType::Integer,
            }
            .is_destructive()
        );

        assert!(
            !SchemaOp::AddTable {
                table: "users".into(),
                columns: vec![]
            }
            .is_destructive()
        );
        assert!(
            !SchemaOp::RenameTable {
                from: "a".into(),
                to: "b".into()
            }
            .is_destructive()
        );
        assert!(!SchemaOp::AddForeignKey { fk }.is_destructive());
    }

    #[test]
    fn test_constraint_name_is_stable() {
        let fk = ForeignKeySpec {
            table: "users".into(),
            column: "team_id".into(),
            references_table: "teams".into(),
            references_column: "id".into(),
        };
        assert_eq!(fk.constraint_name(), "fk_users_team_id");
        assert_eq!(fk.constraint_name(), "fk_users_team_id");
    }

    #[test]
    fn test_describe_mentions_identifiers() {
        let op = SchemaOp::RenameTable {
            from: "articles".into(),
            to: "posts".into(),
        };
        assert_eq!(op.describe(), "renameTable articles -> posts");
        assert_eq!(op.kind_name(), "renameTable");
    }
}
