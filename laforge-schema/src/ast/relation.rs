//! Relation definitions for the LaForge Model AST.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{Ident, Span};

/// The kind of a relation between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Single-valued: the owning model carries the foreign key.
    BelongsTo,
    /// Collection: the target model carries the foreign key.
    HasMany,
    /// Collection through a join table.
    ManyToMany,
}

impl RelationKind {
    /// Parse a relation kind from its DSL keyword.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "belongsTo" => Some(Self::BelongsTo),
            "hasMany" => Some(Self::HasMany),
            "manyToMany" => Some(Self::ManyToMany),
            _ => None,
        }
    }

    /// Get the DSL keyword for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BelongsTo => "belongsTo",
            Self::HasMany => "hasMany",
            Self::ManyToMany => "manyToMany",
        }
    }

    /// Whether the relation yields a collection of rows.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A relation from one model to another.
///
/// The target model is referenced by name and, after validation, by index
/// into the domain's model list. Index references keep the relation graph
/// acyclic at the ownership level and make the snapshot serialization
/// trivial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Relation name (camelCase in source).
    pub name: Ident,
    /// Relation kind.
    pub kind: RelationKind,
    /// Target model name.
    pub target: SmolStr,
    /// Index of the target model in the domain, set by the validator.
    pub target_index: Option<usize>,
    /// Foreign key field name. For belongsTo this is a field on the owning
    /// model; for hasMany it is a field on the target. The validator fills
    /// in the default when the declaration omits it.
    pub foreign_key: SmolStr,
    /// Join table name for manyToMany relations.
    pub through: Option<SmolStr>,
    /// Source location.
    pub span: Span,
}

impl Relation {
    /// Create a new, unresolved relation. The foreign key starts empty and
    /// is filled in by the validator.
    pub fn new(name: Ident, kind: RelationKind, target: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name,
            kind,
            target: target.into(),
            target_index: None,
            foreign_key: SmolStr::default(),
            through: None,
            span,
        }
    }

    /// Get the relation name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Set the join table for a manyToMany relation.
    pub fn with_through(mut self, through: impl Into<SmolStr>) -> Self {
        self.through = Some(through.into());
        self
    }

    /// Set an explicit foreign key.
    pub fn with_foreign_key(mut self, fk: impl Into<SmolStr>) -> Self {
        self.foreign_key = fk.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_from_str() {
        assert_eq!(
            RelationKind::from_str("belongsTo"),
            Some(RelationKind::BelongsTo)
        );
        assert_eq!(RelationKind::from_str("hasMany"), Some(RelationKind::HasMany));
        assert_eq!(
            RelationKind::from_str("manyToMany"),
            Some(RelationKind::ManyToMany)
        );
        assert_eq!(RelationKind::from_str("hasOne"), None);
    }

    #[test]
    fn test_relation_kind_is_collection() {
        assert!(!RelationKind::BelongsTo.is_collection());
        assert!(RelationKind::HasMany.is_collection());
        assert!(RelationKind::ManyToMany.is_collection());
    }

    #[test]
    fn test_relation_new() {
        let rel = Relation::new(
            Ident::new("team", Span::new(0, 4)),
            RelationKind::BelongsTo,
            "Team",
            Span::new(0, 20),
        );
        assert_eq!(rel.name(), "team");
        assert_eq!(rel.target.as_str(), "Team");
        assert!(rel.target_index.is_none());
        assert!(rel.foreign_key.is_empty());
        assert!(rel.through.is_none());
    }

    #[test]
    fn test_relation_builders() {
        let rel = Relation::new(
            Ident::new("tags", Span::new(0, 4)),
            RelationKind::ManyToMany,
            "Tag",
            Span::new(0, 40),
        )
        .with_through("post_tags")
        .with_foreign_key("postId");

        assert_eq!(rel.through.as_deref(), Some("post_tags"));
        assert_eq!(rel.foreign_key.as_str(), "postId");
    }
}
