//! Error types for policy lowering.

use laforge_schema::Span;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for lowering operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while lowering a policy expression to SQL.
///
/// Each variant carries the source span of the offending node; the driver
/// decides how to render it.
#[derive(Error, Debug, Diagnostic)]
pub enum PolicyError {
    /// Identifier resolves to nothing in the policy scope.
    #[error("unknown identifier `{name}` in policy")]
    #[diagnostic(code(laforge::policy::unknown_identifier))]
    UnknownIdentifier { name: String, span: Span },

    /// Property does not exist on the model under the cursor.
    #[error("unknown property `{property}` on model `{model}`")]
    #[diagnostic(code(laforge::policy::unknown_property))]
    UnknownProperty {
        property: String,
        model: String,
        span: Span,
    },

    /// Relation chain exceeds the traversal limit.
    #[error("relation chain exceeds the maximum depth of {max} belongsTo hops")]
    #[diagnostic(code(laforge::policy::chain_too_deep))]
    ChainTooDeep { max: usize, span: Span },

    /// `user.<accessor>` outside the supported scalar set.
    #[error("unknown user accessor `user.{accessor}`; only id, tenantId, and role are available")]
    #[diagnostic(code(laforge::policy::unknown_user_accessor))]
    UnknownUserAccessor { accessor: String, span: Span },

    /// A record or relation reference used where a scalar value is needed.
    #[error("`{name}` is not a scalar value; chain to one of its fields instead")]
    #[diagnostic(code(laforge::policy::not_a_scalar))]
    NotAScalar { name: String, span: Span },

    /// Quantifier or includes on a receiver that is not a collection
    /// relation of the row.
    #[error("`{method}` requires a hasMany or manyToMany relation receiver")]
    #[diagnostic(code(laforge::policy::collection_required))]
    CollectionRequired { method: String, span: Span },

    /// Collection relation used without a quantifier.
    #[error(
        "collection relation `{relation}` must be used with some(...), every(...), or includes(...)"
    )]
    #[diagnostic(code(laforge::policy::collection_misuse))]
    CollectionMisuse { relation: String, span: Span },

    /// manyToMany relation without a join table.
    #[error("manyToMany relation `{relation}` has no through table")]
    #[diagnostic(code(laforge::policy::missing_through))]
    MissingThrough { relation: String, span: Span },

    /// Model shape broken in a way validation should have caught.
    #[error("model `{model}` has no primary key")]
    #[diagnostic(code(laforge::policy::missing_primary_key))]
    MissingPrimaryKey { model: String, span: Span },
}

impl PolicyError {
    /// The source span of the offending expression node.
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownIdentifier { span, .. }
            | Self::UnknownProperty { span, .. }
            | Self::ChainTooDeep { span, .. }
            | Self::UnknownUserAccessor { span, .. }
            | Self::NotAScalar { span, .. }
            | Self::CollectionRequired { span, .. }
            | Self::CollectionMisuse { span, .. }
            | Self::MissingThrough { span, .. }
            | Self::MissingPrimaryKey { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PolicyError::UnknownUserAccessor {
            accessor: "email".into(),
            span: Span::new(3, 13),
        };
        let display = format!("{}", err);
        assert!(display.contains("user.email"));
        assert!(display.contains("tenantId"));
        assert_eq!(err.span(), Span::new(3, 13));
    }

    #[test]
    fn test_chain_depth_message() {
        let err = PolicyError::ChainTooDeep {
            max: 3,
            span: Span::new(0, 10),
        };
        assert!(format!("{}", err).contains("3"));
    }
}
