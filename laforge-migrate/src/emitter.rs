//! Migration emission: sequencing, destructive gating, fallback files.

use chrono::{DateTime, Utc};
use laforge_schema::Dialect;
use tracing::{debug, info};

use crate::diff::DiffResult;
use crate::dialect::{Rendered, adapter_for};
use crate::operation::{ColumnSpec, SchemaOp};
use crate::warning::EmissionWarning;

/// One emitted migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path relative to the project root, e.g. `migrations/..._schema.sql`.
    pub relative_path: String,
    /// File contents.
    pub contents: String,
}

/// The emitted migration set: zero, one, or two files plus warnings.
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    /// Primary migration and, when destructive ops were skipped, the
    /// fallback file.
    pub files: Vec<MigrationFile>,
    /// All warnings: the differ's plus the emitter's.
    pub warnings: Vec<EmissionWarning>,
}

/// Renders an ordered operation sequence into migration files.
pub struct MigrationEmitter {
    dialect: Dialect,
    allow_destructive: bool,
    timestamp: DateTime<Utc>,
}

impl MigrationEmitter {
    /// Create an emitter. The timestamp is fixed at construction so the
    /// primary and fallback filenames stay paired.
    pub fn new(dialect: Dialect, allow_destructive: bool) -> Self {
        Self {
            dialect,
            allow_destructive,
            timestamp: Utc::now(),
        }
    }

    /// Override the generation timestamp (deterministic output for tests
    /// and reproducible builds).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The `yyyymmddHHMMSS` version string used in filenames.
    pub fn version(&self) -> String {
        self.timestamp.format("%Y%m%d%H%M%S").to_string()
    }

    /// Emit the migration file set for a diff. An empty diff produces no
    /// files.
    pub fn emit(&self, diff: &DiffResult) -> MigrationSet {
        let mut warnings = diff.warnings.clone();

        if diff.ops.is_empty() {
            debug!("no operations; skipping migration emission");
            return MigrationSet {
                files: vec![],
                warnings,
            };
        }

        let adapter = adapter_for(self.dialect);
        let mut primary: Vec<String> = vec![];
        let mut fallback: Vec<String> = vec![];

        for op in &diff.ops {
            if op.is_destructive() && !self.allow_destructive {
                warnings.push(EmissionWarning::destructive_skipped(op));
                fallback.push(self.fallback_stanza(op));
                continue;
            }
            match adapter.render(op) {
                Rendered::Sql(sql) => primary.push(sql),
                Rendered::Unsupported(reason) => {
                    warnings.push(EmissionWarning::unsupported(
                        op,
                        self.dialect.as_str(),
                        reason,
                    ));
                    primary.push(format!(
                        "-- {} (unsupported on {}: {})",
                        op.describe(),
                        self.dialect.as_str(),
                        reason
                    ));
                }
            }
        }

        let version = self.version();
        let mut files = vec![MigrationFile {
            relative_path: format!("migrations/{}_schema.sql", version),
            contents: self.render_file(&primary, &warnings),
        }];

        if !fallback.is_empty() {
            files.push(MigrationFile {
                relative_path: format!("migrations/{}_fallback.sql", version),
                contents: self.render_file(&fallback, &warnings),
            });
        }

        info!(
            files = files.len(),
            ops = diff.ops.len(),
            dialect = self.dialect.as_str(),
            "migration emitted"
        );
        MigrationSet { files, warnings }
    }

    fn render_file(&self, stanzas: &[String], warnings: &[EmissionWarning]) -> String {
        let mut out = format!(
            "-- Generated by LaForge at {} UTC\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        for warning in warnings {
            out.push_str(&format!("-- WARNING: {}\n", warning));
        }
        out.push('\n');
        out.push_str(&stanzas.join("\n\n"));
        out.push('\n');
        out
    }

    /// The non-destructive stand-in for a skipped destructive operation.
    fn fallback_stanza(&self, op: &SchemaOp) -> String {
        let adapter = adapter_for(self.dialect);
        let render = |op: &SchemaOp| match adapter.render(op) {
            Rendered::Sql(sql) => sql,
            Rendered::Unsupported(reason) => {
                format!("-- {} (unsupported on {}: {})", op.describe(), self.dialect, reason)
            }
        };

        match op {
            SchemaOp::DropTable { table, .. } => render(&SchemaOp::RenameTable {
                from: table.clone(),
                to: format!("{}_deprecated", table),
            }),
            SchemaOp::DropColumn { table, column } => render(&SchemaOp::RenameColumn {
                table: table.clone(),
                from: column.name.clone(),
                to: format!("{}_deprecated", column.name),
            }),
            SchemaOp::AlterColumnType {
                table,
                column,
                to_ty,
                ..
            } => {
                let shadow = format!("{}_shadow", column);
                let add = render(&SchemaOp::AddColumn {
                    table: table.clone(),
                    column: ColumnSpec {
                        name: shadow.clone(),
                        ty: *to_ty,
                        optional: true,
                        primary_key: false,
                        default: None,
                    },
                });
                format!(
                    "{}\nUPDATE {} SET {} = {};\n-- verify {}, then swap it into place for {} manually",
                    add, table, shadow, column, shadow, column
                )
            }
            SchemaOp::DropForeignKey { fk } => format!(
                "-- foreign key {} on {} left in place; drop it manually when safe",
                fk.constraint_name(),
                fk.table
            ),
            other => format!("-- no fallback for {}", other.describe()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laforge_schema::ScalarType;

    fn fixed_emitter(dialect: Dialect, allow_destructive: bool) -> MigrationEmitter {
        let ts = chrono::DateTime::parse_from_rfc3339("2025-06-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        MigrationEmitter::new(dialect, allow_destructive).with_timestamp(ts)
    }

    fn alter_type_diff() -> DiffResult {
        let op = SchemaOp::AlterColumnType {
            table: "users".into(),
            column: "email".into(),
            from_ty: ScalarType::String,
            to_ty: ScalarType::Integer,
        };
        let warnings = vec![EmissionWarning::destructive(&op)];
        DiffResult {
            ops: vec![op],
            warnings,
        }
    }

    #[test]
    fn test_empty_diff_emits_no_files() {
        let set = fixed_emitter(Dialect::Postgres, true).emit(&DiffResult::default());
        assert!(set.files.is_empty());
        assert!(set.warnings.is_empty());
    }

    #[test]
    fn test_filenames_share_timestamp() {
        let set = fixed_emitter(Dialect::Postgres, false).emit(&alter_type_diff());
        assert_eq!(set.files.len(), 2);
        assert_eq!(
            set.files[0].relative_path,
            "migrations/20250601123045_schema.sql"
        );
        assert_eq!(
            set.files[1].relative_path,
            "migrations/20250601123045_fallback.sql"
        );
    }

    #[test]
    fn test_safe_mode_skips_destructive_and_emits_fallback() {
        let set = fixed_emitter(Dialect::Postgres, false).emit(&alter_type_diff());

        let primary = &set.files[0].contents;
        assert!(!primary.contains("ALTER COLUMN email TYPE"));
        assert!(primary.contains("WARNING: Destructive change skipped"));

        let fallback = &set.files[1].contents;
        assert!(fallback.contains("ADD COLUMN email_shadow INTEGER"));
        assert!(fallback.contains("UPDATE users SET email_shadow = email;"));
        assert!(fallback.contains("swap it into place"));
    }

    #[test]
    fn test_allow_destructive_renders_in_primary() {
        let set = fixed_emitter(Dialect::Postgres, true).emit(&alter_type_diff());
        assert_eq!(set.files.len(), 1);
        assert!(
            set.files[0]
                .contents
                .contains("ALTER TABLE users ALTER COLUMN email TYPE INTEGER")
        );
        // the differ's destructive warning still lands in the header
        assert!(set.files[0].contents.contains("WARNING: Destructive operation"));
    }

    #[test]
    fn test_drop_table_fallback_renames_to_deprecated() {
        let op = SchemaOp::DropTable {
            table: "articles".into(),
            columns: vec![],
        };
        let diff = DiffResult {
            warnings: vec![EmissionWarning::destructive(&op)],
            ops: vec![op],
        };
        let set = fixed_emitter(Dialect::Postgres, false).emit(&diff);
        assert!(
            set.files[1]
                .contents
                .contains("ALTER TABLE articles RENAME TO articles_deprecated;")
        );
    }

    #[test]
    fn test_drop_fk_fallback_is_comment_only() {
        let op = SchemaOp::DropForeignKey {
            fk: crate::operation::ForeignKeySpec {
                table: "users".into(),
                column: "team_id".into(),
                references_table: "teams".into(),
                references_column: "id".into(),
            },
        };
        let diff = DiffResult {
            warnings: vec![],
            ops: vec![op],
        };
        let set = fixed_emitter(Dialect::Postgres, false).emit(&diff);
        let fallback = &set.files[1].contents;
        assert!(fallback.contains("-- foreign key fk_users_team_id"));
        assert!(!fallback.contains("DROP CONSTRAINT"));
    }

    #[test]
    fn test_unsupported_op_commented_with_warning() {
        let set = fixed_emitter(Dialect::Sqlite, true).emit(&alter_type_diff());
        assert_eq!(set.files.len(), 1);
        let primary = &set.files[0].contents;
        assert!(primary.contains("-- alterColumnType users.email"));
        assert!(
            set.warnings
                .iter()
                .any(|w| w.message.contains("not supported on sqlite"))
        );
    }

    #[test]
    fn test_header_contains_timestamp() {
        let set = fixed_emitter(Dialect::Postgres, true).emit(&alter_type_diff());
        assert!(
            set.files[0]
                .contents
                .starts_with("-- Generated by LaForge at 2025-06-01 12:30:45 UTC")
        );
    }
}
