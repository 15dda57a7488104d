//! Lifecycle hook definitions.
//!
//! Hook bodies are carried opaquely through the pipeline: the compiler
//! never interprets them and the snapshot projection drops them.

use serde::{Deserialize, Serialize};

use super::Span;

/// The lifecycle phase a hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPhase {
    /// Before a row is inserted.
    BeforeCreate,
    /// After a row is inserted.
    AfterCreate,
    /// Before a row is updated.
    BeforeUpdate,
    /// After a row is updated.
    AfterUpdate,
    /// Before a row is deleted.
    BeforeDelete,
    /// After a row is deleted.
    AfterDelete,
}

impl HookPhase {
    /// Parse a phase from its DSL keyword.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "beforeCreate" => Some(Self::BeforeCreate),
            "afterCreate" => Some(Self::AfterCreate),
            "beforeUpdate" => Some(Self::BeforeUpdate),
            "afterUpdate" => Some(Self::AfterUpdate),
            "beforeDelete" => Some(Self::BeforeDelete),
            "afterDelete" => Some(Self::AfterDelete),
            _ => None,
        }
    }

    /// Get the DSL keyword for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeCreate => "beforeCreate",
            Self::AfterCreate => "afterCreate",
            Self::BeforeUpdate => "beforeUpdate",
            Self::AfterUpdate => "afterUpdate",
            Self::BeforeDelete => "beforeDelete",
            Self::AfterDelete => "afterDelete",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle hook attached to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    /// The phase the hook runs in.
    pub phase: HookPhase,
    /// Raw body text, brace-balanced, never interpreted.
    pub body: String,
    /// Source location of the whole declaration.
    pub span: Span,
}

impl Hook {
    /// Create a new hook.
    pub fn new(phase: HookPhase, body: impl Into<String>, span: Span) -> Self {
        Self {
            phase,
            body: body.into(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_phase_roundtrip() {
        for phase in [
            HookPhase::BeforeCreate,
            HookPhase::AfterCreate,
            HookPhase::BeforeUpdate,
            HookPhase::AfterUpdate,
            HookPhase::BeforeDelete,
            HookPhase::AfterDelete,
        ] {
            assert_eq!(HookPhase::from_str(phase.as_str()), Some(phase));
        }
        assert_eq!(HookPhase::from_str("beforeSave"), None);
    }

    #[test]
    fn test_hook_body_is_opaque() {
        let hook = Hook::new(
            HookPhase::BeforeCreate,
            "record.slug = slugify(record.title);",
            Span::new(0, 40),
        );
        assert_eq!(hook.phase, HookPhase::BeforeCreate);
        assert!(hook.body.contains("slugify"));
    }
}
