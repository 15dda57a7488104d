//! Non-fatal emission warnings.
//!
//! Warnings accumulate in the compile result and are also rendered as
//! `-- WARNING:` comment lines in the migration header.

use crate::operation::SchemaOp;

/// What a warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A destructive operation is part of the plan.
    Destructive,
    /// A destructive operation was skipped under the safe-mode gate.
    DestructiveSkipped,
    /// A rename heuristic was applied instead of drop+add.
    RenameApplied,
    /// The rename heuristic matched more than one pair and was not applied.
    RenameAmbiguous,
    /// The dialect cannot express the operation; it was commented out.
    DialectUnsupported,
}

/// A human-readable, non-fatal warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionWarning {
    /// Warning category.
    pub kind: WarningKind,
    /// Rendered message.
    pub message: String,
}

impl EmissionWarning {
    /// A destructive operation is present in the plan.
    pub fn destructive(op: &SchemaOp) -> Self {
        Self {
            kind: WarningKind::Destructive,
            message: format!("Destructive operation: {}", op.describe()),
        }
    }

    /// A destructive operation was skipped by the safe-mode gate.
    pub fn destructive_skipped(op: &SchemaOp) -> Self {
        Self {
            kind: WarningKind::DestructiveSkipped,
            message: format!("Destructive change skipped: {}", op.describe()),
        }
    }

    /// A table rename heuristic fired.
    pub fn table_rename(from: &str, to: &str) -> Self {
        Self {
            kind: WarningKind::RenameApplied,
            message: format!("treated {} -> {} as a table rename", from, to),
        }
    }

    /// A column rename heuristic fired.
    pub fn column_rename(table: &str, from: &str, to: &str) -> Self {
        Self {
            kind: WarningKind::RenameApplied,
            message: format!("treated {}.{} -> {} as a column rename", table, from, to),
        }
    }

    /// The rename heuristic was ambiguous and drop+add was used instead.
    pub fn ambiguous_rename(name: &str) -> Self {
        Self {
            kind: WarningKind::RenameAmbiguous,
            message: format!(
                "rename heuristic matched `{}` against more than one candidate; using drop+add",
                name
            ),
        }
    }

    /// The dialect declined the operation.
    pub fn unsupported(op: &SchemaOp, dialect: &str, reason: &str) -> Self {
        Self {
            kind: WarningKind::DialectUnsupported,
            message: format!(
                "{} is not supported on {}: {}; emitted as a comment",
                op.describe(),
                dialect,
                reason
            ),
        }
    }
}

impl std::fmt::Display for EmissionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
