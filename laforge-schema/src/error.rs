//! Error types for domain parsing and validation.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// The coarse error family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Token or parse structure error.
    Syntax,
    /// Model-level invariant violation.
    Semantic,
    /// Policy expression outside the whitelisted grammar.
    Policy,
}

/// Errors produced by the DSL front end and validator.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(laforge::schema::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error with source location.
    #[error("syntax error: {message}")]
    #[diagnostic(code(laforge::schema::syntax))]
    Syntax {
        #[source_code]
        src: String,
        #[label("{message}")]
        span: miette::SourceSpan,
        message: String,
    },

    /// Template (interpolated) string inside a policy body.
    #[error("template strings are not allowed in policies")]
    #[diagnostic(
        code(laforge::schema::template_string),
        help("policies accept only plain string literals")
    )]
    TemplateString {
        #[source_code]
        src: String,
        #[label("interpolated string here")]
        span: miette::SourceSpan,
    },

    /// Policy expression construct outside the whitelist.
    #[error("unsupported expression in policy: {construct}")]
    #[diagnostic(code(laforge::schema::unsupported_expression))]
    UnsupportedExpression {
        #[source_code]
        src: String,
        #[label("not allowed here")]
        span: miette::SourceSpan,
        construct: String,
    },

    /// Model has no `pk` field.
    #[error("model `{model}` has no primary key field")]
    #[diagnostic(code(laforge::schema::missing_primary_key))]
    MissingPrimaryKey { model: String },

    /// Model has more than one `pk` field.
    #[error("model `{model}` declares more than one primary key")]
    #[diagnostic(code(laforge::schema::multiple_primary_keys))]
    MultiplePrimaryKeys { model: String },

    /// Model has more than one `tenant` field.
    #[error("model `{model}` declares more than one tenant field")]
    #[diagnostic(code(laforge::schema::multiple_tenant_fields))]
    MultipleTenantFields { model: String },

    /// Duplicate field name within a model.
    #[error("duplicate field `{field}` in model `{model}`")]
    #[diagnostic(code(laforge::schema::duplicate_field))]
    DuplicateField { model: String, field: String },

    /// Duplicate model name.
    #[error("duplicate model `{name}`")]
    #[diagnostic(code(laforge::schema::duplicate_model))]
    DuplicateModel { name: String },

    /// Two policies for the same model-action pair.
    #[error("duplicate `{action}` policy on model `{model}`")]
    #[diagnostic(code(laforge::schema::duplicate_policy))]
    DuplicatePolicy { model: String, action: String },

    /// Relation target is not a declared model.
    #[error("relation `{model}.{relation}` targets unknown model `{target}`")]
    #[diagnostic(code(laforge::schema::unknown_relation_target))]
    UnknownRelationTarget {
        model: String,
        relation: String,
        target: String,
    },

    /// belongsTo foreign key does not name a scalar field.
    #[error("relation `{model}.{relation}`: foreign key field `{foreign_key}` does not exist")]
    #[diagnostic(code(laforge::schema::unknown_foreign_key))]
    UnknownForeignKey {
        model: String,
        relation: String,
        foreign_key: String,
    },

    /// belongsTo foreign key type differs from the target's primary key type.
    #[error(
        "relation `{model}.{relation}`: foreign key `{foreign_key}` is `{found}` but `{target}` has a `{expected}` primary key"
    )]
    #[diagnostic(code(laforge::schema::foreign_key_type_mismatch))]
    ForeignKeyTypeMismatch {
        model: String,
        relation: String,
        foreign_key: String,
        found: String,
        target: String,
        expected: String,
    },

    /// belongsTo cycle in the relation graph.
    #[error("relation cycle through belongsTo: {path}")]
    #[diagnostic(code(laforge::schema::relation_cycle))]
    RelationCycle { path: String },

    /// Policy or hook attached to an undeclared model.
    #[error("{decl} declaration references unknown model `{model}`")]
    #[diagnostic(code(laforge::schema::unknown_model))]
    UnknownModel { decl: String, model: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(laforge::schema::config))]
    Config { message: String },

    /// TOML parsing error.
    #[error("failed to parse configuration")]
    #[diagnostic(code(laforge::schema::toml))]
    Toml {
        #[source]
        source: toml::de::Error,
    },

    /// Validation failed with multiple issues.
    #[error("domain validation failed with {count} error(s)")]
    #[diagnostic(code(laforge::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create a syntax error with source location.
    pub fn syntax(
        src: impl Into<String>,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            src: src.into(),
            span: (offset, len).into(),
            message: message.into(),
        }
    }

    /// The error family this diagnostic belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::TemplateString { .. } | Self::UnsupportedExpression { .. } => ErrorKind::Policy,
            Self::ValidationFailed { errors, .. } => errors
                .first()
                .map(SchemaError::kind)
                .unwrap_or(ErrorKind::Semantic),
            _ => ErrorKind::Semantic,
        }
    }
}
