//! Core type definitions for the LaForge Model AST.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A span in the source code for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start offset in bytes.
    pub start: usize,
    /// End offset in bytes.
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A zero-width span used for synthesized nodes (snapshot restore).
    pub fn synthetic() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Get the length of the span.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self { start, end }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// An identifier with source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// The identifier name.
    pub name: SmolStr,
    /// Source location.
    pub span: Span,
}

impl Ident {
    /// Create a new identifier.
    pub fn new(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Scalar column types supported by the domain language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// 128-bit universally unique identifier.
    Uuid,
    /// Short string (VARCHAR-class).
    String,
    /// Unbounded text.
    Text,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Date and time with timezone.
    DateTime,
    /// Structured JSON document.
    Jsonb,
}

impl ScalarType {
    /// Parse a scalar type from its DSL keyword.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "uuid" => Some(Self::Uuid),
            "string" => Some(Self::String),
            "text" => Some(Self::Text),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "datetime" => Some(Self::DateTime),
            "jsonb" => Some(Self::Jsonb),
            _ => None,
        }
    }

    /// Get the DSL keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Jsonb => "jsonb",
        }
    }

    /// Get the PostgreSQL column type for this scalar type.
    pub fn postgres_type(&self) -> &'static str {
        match self {
            Self::Uuid => "UUID",
            Self::String => "VARCHAR(255)",
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::DateTime => "TIMESTAMP WITH TIME ZONE",
            Self::Jsonb => "JSONB",
        }
    }

    /// Get the MySQL column type for this scalar type.
    pub fn mysql_type(&self) -> &'static str {
        match self {
            Self::Uuid => "CHAR(36)",
            Self::String => "VARCHAR(255)",
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Boolean => "TINYINT(1)",
            Self::DateTime => "DATETIME",
            Self::Jsonb => "JSON",
        }
    }

    /// Get the SQLite column type for this scalar type.
    pub fn sqlite_type(&self) -> &'static str {
        match self {
            Self::Uuid => "TEXT",
            Self::String => "TEXT",
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Boolean => "INTEGER",
            Self::DateTime => "TEXT",
            Self::Jsonb => "TEXT",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target SQL dialect tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL.
    #[default]
    Postgres,
    /// MySQL (8.0+).
    Mysql,
    /// SQLite (3.25+).
    Sqlite,
}

impl Dialect {
    /// Parse a dialect from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" => Some(Self::Mysql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Get the dialect name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Map a scalar type to this dialect's column type.
    pub fn column_type(&self, ty: ScalarType) -> &'static str {
        match self {
            Self::Postgres => ty.postgres_type(),
            Self::Mysql => ty.mysql_type(),
            Self::Sqlite => ty.sqlite_type(),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
