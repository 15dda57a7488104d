//! Row-level policy definitions and the restricted expression grammar.
//!
//! A policy is a guarded boolean expression attached to a model-action
//! pair. The expression grammar is a closed whitelist, re-implemented here
//! rather than borrowed from a host-language parser: template strings,
//! arithmetic, and free-form calls have no node kinds and therefore cannot
//! survive parsing. The lowering into SQL lives in `laforge-policy`.

use serde::{Deserialize, Serialize};

use super::{Ident, Span};

/// The CRUD action a policy guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyAction {
    /// Row visibility for SELECT.
    Read,
    /// Row admission for INSERT.
    Create,
    /// Row mutability for UPDATE.
    Update,
    /// Row removability for DELETE.
    Delete,
}

impl PolicyAction {
    /// Parse an action from its DSL keyword.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Self::Read),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Get the DSL keyword for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Get the SQL command this action maps to in `CREATE POLICY`.
    pub fn sql_command(&self) -> &'static str {
        match self {
            Self::Read => "SELECT",
            Self::Create => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// All actions, in emission order.
    pub fn all() -> [PolicyAction; 4] {
        [Self::Read, Self::Create, Self::Update, Self::Delete]
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A policy attached to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// The guarded action.
    pub action: PolicyAction,
    /// Arrow-head parameters, if the body used arrow form. The first
    /// parameter aliases the user record, the second the current row.
    pub params: Vec<Ident>,
    /// The guard expression.
    pub expr: Expr,
    /// Source location of the whole policy declaration.
    pub span: Span,
}

impl Policy {
    /// Create a new policy with a bare expression body.
    pub fn new(action: PolicyAction, expr: Expr, span: Span) -> Self {
        Self {
            action,
            params: vec![],
            expr,
            span,
        }
    }

    /// Set the arrow-head parameters.
    pub fn with_params(mut self, params: Vec<Ident>) -> Self {
        self.params = params;
        self
    }
}

/// Binary operators accepted inside policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `===` / `==`
    Eq,
    /// `!==` / `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// The SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Whether this is a logical connective rather than a comparison.
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Collection quantifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuantifierKind {
    /// `.some(x => pred)` — at least one element satisfies the predicate.
    Some,
    /// `.every(x => pred)` — all elements satisfy the predicate.
    Every,
}

impl QuantifierKind {
    /// The DSL method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Some => "some",
            Self::Every => "every",
        }
    }
}

/// A node in the restricted policy expression grammar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Boolean literal.
    Bool { value: bool, span: Span },
    /// String literal (unescaped content).
    Str { value: String, span: Span },
    /// Numeric literal, kept as raw token text so rendering is verbatim.
    Num { raw: String, span: Span },
    /// Bare identifier (`user`, `record`, or an arrow/quantifier binding).
    Ident(Ident),
    /// Member access `object.property`.
    Member {
        /// The receiver expression.
        object: Box<Expr>,
        /// The accessed property.
        property: Ident,
        /// Span of the whole access.
        span: Span,
    },
    /// Logical negation `!operand`.
    Not { operand: Box<Expr>, span: Span },
    /// Binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
        /// Span of the whole operation.
        span: Span,
    },
    /// Parenthesised group; preserved so the emitter never flattens it.
    Group { inner: Box<Expr>, span: Span },
    /// Collection quantifier `receiver.some(binding => predicate)` or
    /// `receiver.every(binding => predicate)`.
    Quantifier {
        /// The collection-valued receiver.
        receiver: Box<Expr>,
        /// `some` or `every`.
        kind: QuantifierKind,
        /// The element binding from the arrow head.
        binding: Ident,
        /// The per-element predicate.
        predicate: Box<Expr>,
        /// Span of the whole call.
        span: Span,
    },
    /// Membership test `receiver.includes(value)`.
    Includes {
        /// The collection-valued receiver.
        receiver: Box<Expr>,
        /// The candidate value.
        value: Box<Expr>,
        /// Span of the whole call.
        span: Span,
    },
}

impl Expr {
    /// Source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Self::Bool { span, .. }
            | Self::Str { span, .. }
            | Self::Num { span, .. }
            | Self::Member { span, .. }
            | Self::Not { span, .. }
            | Self::Binary { span, .. }
            | Self::Group { span, .. }
            | Self::Quantifier { span, .. }
            | Self::Includes { span, .. } => *span,
            Self::Ident(ident) => ident.span,
        }
    }

    /// Whether the rendered SQL of this node needs parentheses when used
    /// as an operand of a logical connective.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Self::Binary { .. } | Self::Not { .. } | Self::Quantifier { .. } | Self::Includes { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 1)
    }

    // ==================== PolicyAction Tests ====================

    #[test]
    fn test_policy_action_from_str() {
        assert_eq!(PolicyAction::from_str("read"), Some(PolicyAction::Read));
        assert_eq!(PolicyAction::from_str("create"), Some(PolicyAction::Create));
        assert_eq!(PolicyAction::from_str("update"), Some(PolicyAction::Update));
        assert_eq!(PolicyAction::from_str("delete"), Some(PolicyAction::Delete));
        assert_eq!(PolicyAction::from_str("select"), None);
        assert_eq!(PolicyAction::from_str("Read"), None);
    }

    #[test]
    fn test_policy_action_sql_command() {
        assert_eq!(PolicyAction::Read.sql_command(), "SELECT");
        assert_eq!(PolicyAction::Create.sql_command(), "INSERT");
        assert_eq!(PolicyAction::Update.sql_command(), "UPDATE");
        assert_eq!(PolicyAction::Delete.sql_command(), "DELETE");
    }

    // ==================== BinaryOp Tests ====================

    #[test]
    fn test_binary_op_as_sql() {
        assert_eq!(BinaryOp::Eq.as_sql(), "=");
        assert_eq!(BinaryOp::Ne.as_sql(), "<>");
        assert_eq!(BinaryOp::Lt.as_sql(), "<");
        assert_eq!(BinaryOp::Le.as_sql(), "<=");
        assert_eq!(BinaryOp::Gt.as_sql(), ">");
        assert_eq!(BinaryOp::Ge.as_sql(), ">=");
        assert_eq!(BinaryOp::And.as_sql(), "AND");
        assert_eq!(BinaryOp::Or.as_sql(), "OR");
    }

    #[test]
    fn test_binary_op_is_logical() {
        assert!(BinaryOp::And.is_logical());
        assert!(BinaryOp::Or.is_logical());
        assert!(!BinaryOp::Eq.is_logical());
        assert!(!BinaryOp::Lt.is_logical());
    }

    // ==================== Expr Tests ====================

    #[test]
    fn test_expr_span() {
        let expr = Expr::Bool {
            value: true,
            span: Span::new(3, 7),
        };
        assert_eq!(expr.span(), Span::new(3, 7));

        let ident = Expr::Ident(Ident::new("user", Span::new(1, 5)));
        assert_eq!(ident.span(), Span::new(1, 5));
    }

    #[test]
    fn test_expr_is_compound() {
        let lit = Expr::Bool {
            value: true,
            span: span(),
        };
        assert!(!lit.is_compound());

        let cmp = Expr::Binary {
            op: BinaryOp::Eq,
            lhs: Box::new(lit.clone()),
            rhs: Box::new(lit.clone()),
            span: span(),
        };
        assert!(cmp.is_compound());

        let not = Expr::Not {
            operand: Box::new(lit.clone()),
            span: span(),
        };
        assert!(not.is_compound());

        let group = Expr::Group {
            inner: Box::new(cmp),
            span: span(),
        };
        assert!(!group.is_compound());
    }

    #[test]
    fn test_policy_with_params() {
        let policy = Policy::new(
            PolicyAction::Read,
            Expr::Bool {
                value: true,
                span: span(),
            },
            span(),
        )
        .with_params(vec![Ident::new("user", span()), Ident::new("record", span())]);

        assert_eq!(policy.params.len(), 2);
        assert_eq!(policy.params[0].as_str(), "user");
    }
}
