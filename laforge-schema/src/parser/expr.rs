//! Precedence-climbing parser for the whitelisted policy expression grammar.
//!
//! Accepted node kinds: literals, identifiers, member access, equality and
//! ordering comparisons, `&&` / `||` / `!`, parenthesised groups, and the
//! three collection methods `some`, `every`, and `includes`. Everything
//! else is rejected here, by grammar, never by post-hoc filtering.

use crate::ast::{BinaryOp, Expr, Ident, QuantifierKind};
use crate::error::{SchemaError, SchemaResult};
use crate::lexer::TokenKind;

use super::Parser;

impl Parser<'_> {
    /// Parse a policy expression.
    pub(crate) fn parse_expr(&mut self) -> SchemaResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> SchemaResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.peek()?.kind == TokenKind::OrOr {
            self.advance()?;
            let rhs = self.parse_and()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> SchemaResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.peek()?.kind == TokenKind::AndAnd {
            self.advance()?;
            let rhs = self.parse_equality()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> SchemaResult<Expr> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::EqEqEq | TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NeEqEq | TokenKind::NeEq => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.advance()?;
            let rhs = self.parse_comparison()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
    }

    fn parse_comparison(&mut self) -> SchemaResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek()?.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance()?;
            let rhs = self.parse_unary()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
    }

    fn parse_unary(&mut self) -> SchemaResult<Expr> {
        if self.peek()?.kind == TokenKind::Bang {
            let bang = self.advance()?;
            let operand = self.parse_unary()?;
            let span = bang.span.merge(operand.span());
            return Ok(Expr::Not {
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> SchemaResult<Expr> {
        let mut expr = self.parse_primary()?;

        while self.peek()?.kind == TokenKind::Dot {
            self.advance()?;
            let property = self.expect_ident("a property name")?;

            if self.peek()?.kind == TokenKind::LParen {
                expr = self.parse_method_call(expr, property)?;
            } else {
                let span = expr.span().merge(property.span);
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    span,
                };
            }
        }

        Ok(expr)
    }

    /// Only `some`, `every`, and `includes` exist; anything else is outside
    /// the whitelist.
    fn parse_method_call(&mut self, receiver: Expr, method: Ident) -> SchemaResult<Expr> {
        match method.as_str() {
            "some" | "every" => {
                let kind = if method.as_str() == "some" {
                    QuantifierKind::Some
                } else {
                    QuantifierKind::Every
                };
                self.expect(TokenKind::LParen, "`(`")?;
                let binding = self.expect_ident("a binding name")?;
                self.expect(TokenKind::Arrow, "`=>`")?;
                let predicate = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen, "`)`")?;
                let span = receiver.span().merge(close.span);
                Ok(Expr::Quantifier {
                    receiver: Box::new(receiver),
                    kind,
                    binding,
                    predicate: Box::new(predicate),
                    span,
                })
            }
            "includes" => {
                self.expect(TokenKind::LParen, "`(`")?;
                let value = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen, "`)`")?;
                let span = receiver.span().merge(close.span);
                Ok(Expr::Includes {
                    receiver: Box::new(receiver),
                    value: Box::new(value),
                    span,
                })
            }
            other => Err(SchemaError::UnsupportedExpression {
                src: self.source().to_string(),
                span: method.span.into(),
                construct: format!("call to `{}`", other),
            }),
        }
    }

    fn parse_primary(&mut self) -> SchemaResult<Expr> {
        let token = self.advance()?;
        match &token.kind {
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Bool {
                    value: true,
                    span: token.span,
                }),
                "false" => Ok(Expr::Bool {
                    value: false,
                    span: token.span,
                }),
                _ => Ok(Expr::Ident(Ident::new(name.clone(), token.span))),
            },
            TokenKind::Num(raw) => Ok(Expr::Num {
                raw: raw.to_string(),
                span: token.span,
            }),
            TokenKind::Str(value) => Ok(Expr::Str {
                value: value.clone(),
                span: token.span,
            }),
            TokenKind::TemplateStr => Err(SchemaError::TemplateString {
                src: self.source().to_string(),
                span: token.span.into(),
            }),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                let close = self.expect(TokenKind::RParen, "`)`")?;
                Ok(Expr::Group {
                    inner: Box::new(inner),
                    span: token.span.merge(close.span),
                })
            }
            other => Err(self.err_at(
                &token,
                format!("expected an expression, found {}", other.describe()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::SchemaError;
    use crate::parser::parse_domain;

    fn parse_policy_expr(body: &str) -> Result<Expr, SchemaError> {
        let src = format!("model M {{ id: uuid pk }} policy M.read {{ {} }}", body);
        let domain = parse_domain(&src)?;
        Ok(domain
            .get_model("M")
            .unwrap()
            .policy(PolicyAction::Read)
            .unwrap()
            .expr
            .clone())
    }

    // ==================== Accepted Grammar ====================

    #[test]
    fn test_parse_literals() {
        assert!(matches!(
            parse_policy_expr("true").unwrap(),
            Expr::Bool { value: true, .. }
        ));
        assert!(matches!(
            parse_policy_expr("false").unwrap(),
            Expr::Bool { value: false, .. }
        ));
        assert!(matches!(parse_policy_expr("42").unwrap(), Expr::Num { .. }));
        assert!(
            matches!(parse_policy_expr("\"admin\"").unwrap(), Expr::Str { value, .. } if value == "admin")
        );
    }

    #[test]
    fn test_parse_member_chain() {
        let expr = parse_policy_expr("record.team.id").unwrap();
        let Expr::Member {
            object, property, ..
        } = expr
        else {
            panic!("expected member access");
        };
        assert_eq!(property.as_str(), "id");
        assert!(matches!(*object, Expr::Member { .. }));
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        // a || b && c parses as a || (b && c)
        let expr = parse_policy_expr("user.id === 1 || user.id === 2 && user.id === 3").unwrap();
        let Expr::Binary {
            op: BinaryOp::Or,
            rhs,
            ..
        } = expr
        else {
            panic!("expected || at the root");
        };
        assert!(matches!(
            *rhs,
            Expr::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_group_preserved() {
        let expr = parse_policy_expr("(user.id === 1 || user.id === 2) && true").unwrap();
        let Expr::Binary {
            op: BinaryOp::And,
            lhs,
            ..
        } = expr
        else {
            panic!("expected && at the root");
        };
        assert!(matches!(*lhs, Expr::Group { .. }));
    }

    #[test]
    fn test_parse_not() {
        let expr = parse_policy_expr("!record.archived").unwrap();
        assert!(matches!(expr, Expr::Not { .. }));
    }

    #[test]
    fn test_parse_comparisons() {
        for (src, op) in [
            ("record.rank < 5", BinaryOp::Lt),
            ("record.rank <= 5", BinaryOp::Le),
            ("record.rank > 5", BinaryOp::Gt),
            ("record.rank >= 5", BinaryOp::Ge),
            ("record.rank == 5", BinaryOp::Eq),
            ("record.rank != 5", BinaryOp::Ne),
            ("record.rank === 5", BinaryOp::Eq),
            ("record.rank !== 5", BinaryOp::Ne),
        ] {
            let expr = parse_policy_expr(src).unwrap();
            assert!(
                matches!(expr, Expr::Binary { op: got, .. } if got == op),
                "wrong operator for {}",
                src
            );
        }
    }

    #[test]
    fn test_parse_some_quantifier() {
        let expr = parse_policy_expr("record.comments.some(c => c.id === user.id)").unwrap();
        let Expr::Quantifier {
            kind, binding, ..
        } = expr
        else {
            panic!("expected quantifier");
        };
        assert_eq!(kind, QuantifierKind::Some);
        assert_eq!(binding.as_str(), "c");
    }

    #[test]
    fn test_parse_every_quantifier() {
        let expr = parse_policy_expr("record.tasks.every(t => t.done === true)").unwrap();
        assert!(matches!(
            expr,
            Expr::Quantifier {
                kind: QuantifierKind::Every,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_includes() {
        let expr = parse_policy_expr("record.members.includes(user.id)").unwrap();
        assert!(matches!(expr, Expr::Includes { .. }));
    }

    // ==================== Rejected Grammar ====================

    #[test]
    fn test_reject_template_string() {
        let err = parse_policy_expr("record.name === `admin-${user.id}`").unwrap_err();
        assert!(matches!(err, SchemaError::TemplateString { .. }));
    }

    #[test]
    fn test_reject_free_form_call() {
        let err = parse_policy_expr("record.items.filter(x => x)").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedExpression { .. }));
    }

    #[test]
    fn test_reject_arithmetic() {
        // `+` is not even a token of the language
        assert!(parse_policy_expr("record.count + 1 === 2").is_err());
    }

    #[test]
    fn test_reject_lone_assignment() {
        assert!(parse_policy_expr("record.count = 2").is_err());
    }
}
