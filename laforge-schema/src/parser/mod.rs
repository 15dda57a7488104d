//! Hand-written recursive-descent parser for LaForge domain files.
//!
//! A domain file is a sequence of top-level declarations: `model`,
//! `policy Model.action { body }`, and `hook Model.phase { body }`.
//! Policies and hooks may appear before the model they attach to; the
//! parser attaches them after the whole file has been read.

mod expr;

use std::collections::VecDeque;

use smol_str::SmolStr;

use crate::ast::*;
use crate::error::{SchemaError, SchemaResult};
use crate::lexer::{Lexer, Token, TokenKind};

/// Parse a domain file into an unvalidated [`Domain`].
///
/// The result still needs [`crate::validator::Validator`] to enforce the
/// model invariants and resolve relation targets.
pub fn parse_domain(input: &str) -> SchemaResult<Domain> {
    Parser::new(input).parse()
}

/// Field modifier keywords. Anything else in modifier position starts the
/// next declaration.
const MODIFIERS: &[&str] = &["pk", "tenant", "optional", "secret", "default", "residency"];

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    buffer: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            buffer: VecDeque::new(),
        }
    }

    // ==================== Token plumbing ====================

    fn fill(&mut self, n: usize) -> SchemaResult<()> {
        while self.buffer.len() <= n {
            let token = self.lexer.next_token()?;
            self.buffer.push_back(token);
        }
        Ok(())
    }

    pub(crate) fn peek(&mut self) -> SchemaResult<&Token> {
        self.fill(0)?;
        Ok(&self.buffer[0])
    }

    fn peek_n(&mut self, n: usize) -> SchemaResult<&Token> {
        self.fill(n)?;
        Ok(&self.buffer[n])
    }

    pub(crate) fn advance(&mut self) -> SchemaResult<Token> {
        self.fill(0)?;
        Ok(self.buffer.pop_front().expect("buffer filled"))
    }

    pub(crate) fn err_at(&self, token: &Token, message: impl Into<String>) -> SchemaError {
        SchemaError::syntax(
            self.lexer.source(),
            token.span.start,
            token.span.len().max(1),
            message,
        )
    }

    pub(crate) fn source(&self) -> &str {
        self.lexer.source()
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> SchemaResult<Token> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.err_at(
                &token,
                format!("expected {}, found {}", what, token.kind.describe()),
            ))
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> SchemaResult<Ident> {
        let token = self.advance()?;
        match &token.kind {
            TokenKind::Ident(name) => Ok(Ident::new(name.clone(), token.span)),
            other => Err(self.err_at(
                &token,
                format!("expected {}, found {}", what, other.describe()),
            )),
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> SchemaResult<bool> {
        if &self.peek()?.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ==================== Top level ====================

    fn parse(mut self) -> SchemaResult<Domain> {
        let mut domain = Domain::new();
        let mut policies: Vec<(Ident, Policy)> = vec![];
        let mut hooks: Vec<(Ident, Hook)> = vec![];

        loop {
            let token = self.peek()?.clone();
            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::Ident(name) => match name.as_str() {
                    "model" => {
                        let model = self.parse_model()?;
                        if let Some(previous) = domain.add_model(model) {
                            return Err(SchemaError::DuplicateModel {
                                name: previous.name().to_string(),
                            });
                        }
                    }
                    "policy" => {
                        let (model, policy) = self.parse_policy_decl()?;
                        policies.push((model, policy));
                    }
                    "hook" => {
                        let (model, hook) = self.parse_hook_decl()?;
                        hooks.push((model, hook));
                    }
                    other => {
                        let message = format!(
                            "unknown top-level keyword `{}`; expected `model`, `policy`, or `hook`",
                            other
                        );
                        return Err(self.err_at(&token, message));
                    }
                },
                _ => {
                    return Err(self.err_at(
                        &token,
                        format!("expected a declaration, found {}", token.kind.describe()),
                    ));
                }
            }
        }

        for (model_name, policy) in policies {
            match domain.get_model_mut(model_name.as_str()) {
                Some(model) => model.add_policy(policy),
                None => {
                    return Err(SchemaError::UnknownModel {
                        decl: "policy".to_string(),
                        model: model_name.to_string(),
                    });
                }
            }
        }

        for (model_name, hook) in hooks {
            match domain.get_model_mut(model_name.as_str()) {
                Some(model) => model.add_hook(hook),
                None => {
                    return Err(SchemaError::UnknownModel {
                        decl: "hook".to_string(),
                        model: model_name.to_string(),
                    });
                }
            }
        }

        Ok(domain)
    }

    // ==================== Models ====================

    fn parse_model(&mut self) -> SchemaResult<Model> {
        let keyword = self.advance()?; // `model`
        let name = self.expect_ident("a model name")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut model = Model::new(name, keyword.span);

        loop {
            if self.eat(&TokenKind::Semi)? {
                continue;
            }
            let token = self.peek()?.clone();
            match &token.kind {
                TokenKind::RBrace => {
                    let close = self.advance()?;
                    model.span = model.span.merge(close.span);
                    return Ok(model);
                }
                TokenKind::Ident(_) => {
                    self.parse_model_entry(&mut model)?;
                }
                TokenKind::Eof => {
                    return Err(self.err_at(&token, "unbalanced braces: model body never closed"));
                }
                _ => {
                    return Err(self.err_at(
                        &token,
                        format!(
                            "expected a field or relation declaration, found {}",
                            token.kind.describe()
                        ),
                    ));
                }
            }
        }
    }

    /// Parse one `name: type modifiers` or `name: kind(Target, ...)` entry.
    fn parse_model_entry(&mut self, model: &mut Model) -> SchemaResult<()> {
        let name = self.expect_ident("a field name")?;
        self.expect(TokenKind::Colon, "`:`")?;
        let type_ident = self.expect_ident("a type")?;

        if let Some(kind) = RelationKind::from_str(type_ident.as_str()) {
            let relation = self.parse_relation(name, kind)?;
            model.add_relation(relation);
            return Ok(());
        }

        let Some(ty) = ScalarType::from_str(type_ident.as_str()) else {
            return Err(SchemaError::syntax(
                self.source(),
                type_ident.span.start,
                type_ident.span.len().max(1),
                format!("unknown type `{}`", type_ident),
            ));
        };

        let mut field = Field::new(name, ty, type_ident.span);
        self.parse_field_modifiers(&mut field)?;

        if let Some(previous) = model.add_field(field) {
            return Err(SchemaError::DuplicateField {
                model: model.name().to_string(),
                field: previous.name().to_string(),
            });
        }
        Ok(())
    }

    fn parse_field_modifiers(&mut self, field: &mut Field) -> SchemaResult<()> {
        loop {
            let token = self.peek()?;
            let TokenKind::Ident(name) = &token.kind else {
                return Ok(());
            };
            if !MODIFIERS.contains(&name.as_str()) {
                return Ok(());
            }
            let modifier = self.expect_ident("a modifier")?;
            match modifier.as_str() {
                "pk" => field.primary_key = true,
                "tenant" => field.tenant = true,
                "optional" => field.optional = true,
                "secret" => field.secret = true,
                "default" => {
                    let token = self.advance()?;
                    match &token.kind {
                        TokenKind::Str(value) => field.default = Some(SmolStr::new(value)),
                        _ => {
                            return Err(
                                self.err_at(&token, "expected a quoted literal after `default`")
                            );
                        }
                    }
                }
                "residency" => {
                    let tag = self.expect_ident("a residency tag")?;
                    field.residency = Some(tag.name);
                }
                _ => unreachable!("modifier set checked above"),
            }
        }
    }

    fn parse_relation(&mut self, name: Ident, kind: RelationKind) -> SchemaResult<Relation> {
        self.expect(TokenKind::LParen, "`(`")?;
        let target = self.expect_ident("a target model name")?;
        let mut relation = Relation::new(name, kind, target.name, target.span);

        while self.eat(&TokenKind::Comma)? {
            let key = self.expect_ident("an argument name")?;
            self.expect(TokenKind::Colon, "`:`")?;
            let value = self.advance()?;
            let TokenKind::Str(text) = &value.kind else {
                return Err(self.err_at(&value, format!("expected a quoted value for `{}`", key)));
            };
            match key.as_str() {
                "through" => relation.through = Some(SmolStr::new(text)),
                "foreignKey" => relation.foreign_key = SmolStr::new(text),
                other => {
                    return Err(SchemaError::syntax(
                        self.source(),
                        key.span.start,
                        key.span.len().max(1),
                        format!("unknown relation argument `{}`", other),
                    ));
                }
            }
        }

        self.expect(TokenKind::RParen, "`)`")?;
        Ok(relation)
    }

    // ==================== Policies ====================

    fn parse_policy_decl(&mut self) -> SchemaResult<(Ident, Policy)> {
        let keyword = self.advance()?; // `policy`
        let model = self.expect_ident("a model name")?;
        self.expect(TokenKind::Dot, "`.`")?;
        let action_ident = self.expect_ident("a policy action")?;

        let Some(action) = PolicyAction::from_str(action_ident.as_str()) else {
            return Err(SchemaError::syntax(
                self.source(),
                action_ident.span.start,
                action_ident.span.len().max(1),
                format!(
                    "unknown policy action `{}`; expected read, create, update, or delete",
                    action_ident
                ),
            ));
        };

        self.expect(TokenKind::LBrace, "`{`")?;

        let params = if self.at_arrow_head()? {
            self.parse_arrow_params()?
        } else {
            vec![]
        };

        let expr = if self.at_keyword("return")? {
            self.advance()?;
            let expr = self.parse_expr()?;
            self.eat(&TokenKind::Semi)?;
            expr
        } else {
            self.parse_expr()?
        };

        let close = self.expect(TokenKind::RBrace, "`}` to close the policy body")?;

        let policy = Policy::new(action, expr, keyword.span.merge(close.span)).with_params(params);
        Ok((model, policy))
    }

    fn at_keyword(&mut self, keyword: &str) -> SchemaResult<bool> {
        Ok(matches!(&self.peek()?.kind, TokenKind::Ident(name) if name.as_str() == keyword))
    }

    /// Detect `(a, b, ...) =>` without consuming anything.
    fn at_arrow_head(&mut self) -> SchemaResult<bool> {
        if self.peek()?.kind != TokenKind::LParen {
            return Ok(false);
        }
        let mut i = 1;
        loop {
            match &self.peek_n(i)?.kind {
                TokenKind::Ident(_) => {
                    i += 1;
                    match &self.peek_n(i)?.kind {
                        TokenKind::Comma => i += 1,
                        TokenKind::RParen => {
                            i += 1;
                            break;
                        }
                        _ => return Ok(false),
                    }
                }
                TokenKind::RParen if i == 1 => {
                    i += 1;
                    break;
                }
                _ => return Ok(false),
            }
        }
        Ok(self.peek_n(i)?.kind == TokenKind::Arrow)
    }

    fn parse_arrow_params(&mut self) -> SchemaResult<Vec<Ident>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = vec![];
        if self.peek()?.kind != TokenKind::RParen {
            loop {
                params.push(self.expect_ident("a parameter name")?);
                if !self.eat(&TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Arrow, "`=>`")?;
        Ok(params)
    }

    // ==================== Hooks ====================

    fn parse_hook_decl(&mut self) -> SchemaResult<(Ident, Hook)> {
        let keyword = self.advance()?; // `hook`
        let model = self.expect_ident("a model name")?;
        self.expect(TokenKind::Dot, "`.`")?;
        let phase_ident = self.expect_ident("a hook phase")?;

        let Some(phase) = HookPhase::from_str(phase_ident.as_str()) else {
            return Err(SchemaError::syntax(
                self.source(),
                phase_ident.span.start,
                phase_ident.span.len().max(1),
                format!("unknown hook phase `{}`", phase_ident),
            ));
        };

        self.expect(TokenKind::LBrace, "`{`")?;
        debug_assert!(self.buffer.is_empty(), "raw capture needs a drained buffer");
        let (body, body_span) = self.lexer.raw_block()?;

        Ok((
            model,
            Hook::new(phase, body, keyword.span.merge(body_span)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Model Parsing ====================

    #[test]
    fn test_parse_simple_model() {
        let domain = parse_domain(
            r#"
            model Note {
                id: uuid pk
                tenantId: uuid tenant
                text: string
            }
        "#,
        )
        .unwrap();

        assert_eq!(domain.len(), 1);
        let note = domain.get_model("Note").unwrap();
        assert_eq!(note.fields.len(), 3);
        assert!(note.get_field("id").unwrap().primary_key);
        assert!(note.get_field("tenantId").unwrap().tenant);
        assert_eq!(note.get_field("text").unwrap().ty, ScalarType::String);
    }

    #[test]
    fn test_parse_semicolon_separated_fields() {
        let domain =
            parse_domain("model Note { id: uuid pk; tenantId: uuid tenant; text: string }")
                .unwrap();
        assert_eq!(domain.get_model("Note").unwrap().fields.len(), 3);
    }

    #[test]
    fn test_parse_all_modifiers() {
        let domain = parse_domain(
            r#"
            model Account {
                id: uuid pk
                bio: text optional
                apiKey: string secret
                status: string default "active"
                region: string residency eu
            }
        "#,
        )
        .unwrap();

        let account = domain.get_model("Account").unwrap();
        assert!(account.get_field("bio").unwrap().optional);
        assert!(account.get_field("apiKey").unwrap().secret);
        assert_eq!(
            account.get_field("status").unwrap().default.as_deref(),
            Some("active")
        );
        assert_eq!(
            account.get_field("region").unwrap().residency.as_deref(),
            Some("eu")
        );
    }

    #[test]
    fn test_parse_relations() {
        let domain = parse_domain(
            r#"
            model Team { id: uuid pk }
            model User {
                id: uuid pk
                teamId: uuid
                team: belongsTo(Team)
                posts: hasMany(Post)
                groups: manyToMany(Group, through: "user_groups")
            }
        "#,
        )
        .unwrap();

        let user = domain.get_model("User").unwrap();
        assert_eq!(user.relations.len(), 3);

        let team = user.get_relation("team").unwrap();
        assert_eq!(team.kind, RelationKind::BelongsTo);
        assert_eq!(team.target.as_str(), "Team");

        let groups = user.get_relation("groups").unwrap();
        assert_eq!(groups.kind, RelationKind::ManyToMany);
        assert_eq!(groups.through.as_deref(), Some("user_groups"));
    }

    #[test]
    fn test_parse_explicit_foreign_key() {
        let domain = parse_domain(
            r#"
            model User {
                id: uuid pk
                ownerId: uuid
                owner: belongsTo(User, foreignKey: "ownerId")
            }
        "#,
        )
        .unwrap();

        let owner = domain
            .get_model("User")
            .unwrap()
            .get_relation("owner")
            .unwrap();
        assert_eq!(owner.foreign_key.as_str(), "ownerId");
    }

    #[test]
    fn test_parse_comments() {
        let domain = parse_domain(
            r#"
            // the core model
            model Note {
                id: uuid pk /* inline */
                text: string
            }
        "#,
        )
        .unwrap();
        assert_eq!(domain.get_model("Note").unwrap().fields.len(), 2);
    }

    // ==================== Policy Parsing ====================

    #[test]
    fn test_parse_bare_policy() {
        let domain = parse_domain(
            r#"
            model Note { id: uuid pk }
            policy Note.read { true }
        "#,
        )
        .unwrap();

        let note = domain.get_model("Note").unwrap();
        let policy = note.policy(PolicyAction::Read).unwrap();
        assert!(matches!(policy.expr, Expr::Bool { value: true, .. }));
        assert!(policy.params.is_empty());
    }

    #[test]
    fn test_parse_arrow_policy() {
        let domain = parse_domain(
            r#"
            model Note { id: uuid pk; ownerId: uuid }
            policy Note.update { (user, record) => record.ownerId === user.id }
        "#,
        )
        .unwrap();

        let policy = domain
            .get_model("Note")
            .unwrap()
            .policy(PolicyAction::Update)
            .unwrap();
        assert_eq!(policy.params.len(), 2);
        assert!(matches!(
            policy.expr,
            Expr::Binary {
                op: BinaryOp::Eq,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_block_policy() {
        let domain = parse_domain(
            r#"
            model Note { id: uuid pk }
            policy Note.delete { return user.role === "admin"; }
        "#,
        )
        .unwrap();

        let policy = domain
            .get_model("Note")
            .unwrap()
            .policy(PolicyAction::Delete)
            .unwrap();
        assert!(matches!(policy.expr, Expr::Binary { .. }));
    }

    #[test]
    fn test_parse_parenthesized_policy_body_is_not_arrow() {
        let domain = parse_domain(
            r#"
            model Note { id: uuid pk; done: boolean }
            policy Note.read { (record.done === true) }
        "#,
        )
        .unwrap();

        let policy = domain
            .get_model("Note")
            .unwrap()
            .policy(PolicyAction::Read)
            .unwrap();
        assert!(matches!(policy.expr, Expr::Group { .. }));
    }

    #[test]
    fn test_policy_on_unknown_model_fails() {
        let result = parse_domain("policy Ghost.read { true }");
        assert!(matches!(result, Err(SchemaError::UnknownModel { .. })));
    }

    #[test]
    fn test_unknown_policy_action_fails() {
        let result = parse_domain(
            r#"
            model Note { id: uuid pk }
            policy Note.select { true }
        "#,
        );
        assert!(result.is_err());
    }

    // ==================== Hook Parsing ====================

    #[test]
    fn test_parse_hook_body_opaque() {
        let domain = parse_domain(
            r#"
            model Note { id: uuid pk }
            hook Note.beforeCreate {
                record.slug = slugify(record.title);
                if (record.slug === "") { record.slug = "untitled"; }
            }
        "#,
        )
        .unwrap();

        let note = domain.get_model("Note").unwrap();
        assert_eq!(note.hooks.len(), 1);
        assert_eq!(note.hooks[0].phase, HookPhase::BeforeCreate);
        assert!(note.hooks[0].body.contains("slugify"));
        assert!(note.hooks[0].body.contains("untitled"));
    }

    #[test]
    fn test_hook_on_unknown_model_fails() {
        let result = parse_domain("hook Ghost.afterDelete { cleanup(); }");
        assert!(matches!(result, Err(SchemaError::UnknownModel { .. })));
    }

    #[test]
    fn test_unknown_hook_phase_fails() {
        let result = parse_domain(
            r#"
            model Note { id: uuid pk }
            hook Note.onSave { x(); }
        "#,
        );
        assert!(result.is_err());
    }

    // ==================== Error Handling ====================

    #[test]
    fn test_unknown_top_level_keyword() {
        let err = parse_domain("widget Foo {}").unwrap_err();
        assert!(format!("{:?}", err).contains("unknown top-level keyword"));
    }

    #[test]
    fn test_unknown_field_type() {
        let result = parse_domain("model Note { id: float pk }");
        assert!(result.is_err());
    }

    #[test]
    fn test_unbalanced_model_body() {
        let result = parse_domain("model Note { id: uuid pk");
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = parse_domain("model Note { id: uuid pk; id: string }");
        assert!(matches!(result, Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn test_duplicate_model_rejected() {
        let result = parse_domain("model A { id: uuid pk } model A { id: uuid pk }");
        assert!(matches!(result, Err(SchemaError::DuplicateModel { .. })));
    }

    #[test]
    fn test_empty_input() {
        let domain = parse_domain("").unwrap();
        assert!(domain.is_empty());
    }

    #[test]
    fn test_comments_only() {
        let domain = parse_domain("// nothing here\n/* at all */").unwrap();
        assert!(domain.is_empty());
    }
}
