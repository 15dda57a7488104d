//! Scalar field definitions for the LaForge Model AST.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{Ident, ScalarType, Span};

/// A scalar field on a model (maps to a table column).
///
/// A field is never a relation; relations live in [`super::Relation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name (camelCase in source).
    pub name: Ident,
    /// Scalar type.
    pub ty: ScalarType,
    /// Whether the column is nullable (`optional` modifier).
    pub optional: bool,
    /// Whether this field is the primary key (`pk` modifier).
    pub primary_key: bool,
    /// Whether this is the tenant partition column (`tenant` modifier).
    pub tenant: bool,
    /// Whether the field holds sensitive data (`secret` modifier).
    pub secret: bool,
    /// Default value as raw literal text (`default "<literal>"`).
    pub default: Option<SmolStr>,
    /// Data-residency tag (`residency <tag>`).
    pub residency: Option<SmolStr>,
    /// Source location.
    pub span: Span,
}

impl Field {
    /// Create a new required field with no modifiers.
    pub fn new(name: Ident, ty: ScalarType, span: Span) -> Self {
        Self {
            name,
            ty,
            optional: false,
            primary_key: false,
            tenant: false,
            secret: false,
            default: None,
            residency: None,
            span,
        }
    }

    /// Get the field name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Mark the field as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark the field as the tenant column.
    pub fn tenant(mut self) -> Self {
        self.tenant = true;
        self
    }

    /// Mark the field as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as secret.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Set the default literal.
    pub fn with_default(mut self, literal: impl Into<SmolStr>) -> Self {
        self.default = Some(literal.into());
        self
    }

    /// Set the residency tag.
    pub fn with_residency(mut self, tag: impl Into<SmolStr>) -> Self {
        self.residency = Some(tag.into());
        self
    }

    /// The structural signature used by the differ's rename heuristics:
    /// everything that shapes the column, excluding the name.
    pub fn signature(&self) -> (ScalarType, bool, bool, bool, Option<&str>) {
        (
            self.ty,
            self.optional,
            self.primary_key,
            self.tenant,
            self.default.as_deref(),
        )
    }
}
