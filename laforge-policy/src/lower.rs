//! Lowering of policy expression trees into SQL predicates.
//!
//! The lowerer walks the whitelisted expression grammar, resolves
//! identifiers against the owning model's environment, and emits a SQL
//! predicate. `user.*` scalars read session settings installed by the
//! runtime; `record.*` accesses become bare columns or correlated
//! subqueries over belongsTo chains; collection quantifiers become
//! `EXISTS` / `NOT EXISTS` / `IN` subqueries.

use laforge_schema::{
    Domain, Expr, Model, Policy, QuantifierKind, Relation, RelationKind, Span, names,
};
use smol_str::SmolStr;
use tracing::debug;

use crate::error::{PolicyError, PolicyResult};

/// Maximum number of belongsTo hops a relation chain may traverse.
pub const MAX_CHAIN_DEPTH: usize = 3;

/// SQL expression reading the authenticated user id from the session.
pub const USER_ID_SQL: &str = "laforge_user_id()";

/// SQL expression reading the tenant id from the session.
pub const TENANT_ID_SQL: &str = "current_setting('app.tenant_id')::uuid";

/// SQL expression reading the user role from the session.
pub const ROLE_SQL: &str = "current_setting('app.role')";

/// Lower a policy to a SQL predicate.
///
/// When `multi_tenant` is set and the owning model has a tenant field, the
/// result is `(tenant_col = <session tenant>) AND (<policy-expr>)`;
/// policies on untenanted models are emitted unchanged.
pub fn lower_policy(
    domain: &Domain,
    model: &Model,
    policy: &Policy,
    multi_tenant: bool,
) -> PolicyResult<String> {
    let mut lowerer = Lowerer::new(domain, model);

    // the arrow head re-binds the standard scope positionally
    if let Some(param) = policy.params.first() {
        lowerer.bind(param.name.clone(), Scope::User);
    }
    if let Some(param) = policy.params.get(1) {
        lowerer.bind(param.name.clone(), lowerer.owner_scope());
    }

    let expr_sql = lowerer.lower_expr(&policy.expr)?;

    let sql = match (multi_tenant, model.tenant_field()) {
        (true, Some(tenant)) => {
            let column = names::column_name(tenant.name());
            format!("({} = {}) AND ({})", column, TENANT_ID_SQL, expr_sql)
        }
        _ => expr_sql,
    };

    debug!(model = model.name(), action = %policy.action, "policy lowered");
    Ok(sql)
}

/// What a name in scope refers to.
#[derive(Debug, Clone)]
enum Scope {
    /// The authenticated user record; only scalar accessors exist.
    User,
    /// A row of a model. `prefix` qualifies column references: empty for
    /// the policy's own row, `"s0."` and deeper for quantifier bindings.
    Row { model_index: usize, prefix: String },
}

struct Lowerer<'a> {
    domain: &'a Domain,
    bindings: Vec<(SmolStr, Scope)>,
    quantifier_depth: usize,
}

impl<'a> Lowerer<'a> {
    fn new(domain: &'a Domain, model: &'a Model) -> Self {
        let owner_index = domain
            .model_index(model.name())
            .expect("owning model is part of the domain");
        let bindings = vec![
            (SmolStr::new("user"), Scope::User),
            (
                SmolStr::new("record"),
                Scope::Row {
                    model_index: owner_index,
                    prefix: String::new(),
                },
            ),
        ];
        Self {
            domain,
            bindings,
            quantifier_depth: 0,
        }
    }

    fn owner_scope(&self) -> Scope {
        self.bindings[1].1.clone()
    }

    fn bind(&mut self, name: SmolStr, scope: Scope) {
        self.bindings.push((name, scope));
    }

    fn resolve(&self, name: &str) -> Option<&Scope> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, s)| s)
    }

    fn model_at(&self, index: usize) -> &'a Model {
        self.domain.model_at(index).expect("resolved model index")
    }

    fn primary_key_column(&self, model: &Model, span: Span) -> PolicyResult<String> {
        let pk = model
            .primary_key()
            .ok_or_else(|| PolicyError::MissingPrimaryKey {
                model: model.name().to_string(),
                span,
            })?;
        Ok(names::column_name(pk.name()))
    }

    // ==================== Expression dispatch ====================

    fn lower_expr(&mut self, expr: &Expr) -> PolicyResult<String> {
        match expr {
            Expr::Bool { value, .. } => Ok(if *value { "TRUE" } else { "FALSE" }.to_string()),
            Expr::Num { raw, .. } => Ok(raw.clone()),
            Expr::Str { value, .. } => Ok(quote_str(value)),
            Expr::Ident(ident) => match self.resolve(ident.as_str()) {
                Some(_) => Err(PolicyError::NotAScalar {
                    name: ident.to_string(),
                    span: ident.span,
                }),
                None => Err(PolicyError::UnknownIdentifier {
                    name: ident.to_string(),
                    span: ident.span,
                }),
            },
            Expr::Member { .. } => self.lower_member(expr),
            Expr::Not { operand, .. } => Ok(format!("NOT ({})", self.lower_expr(operand)?)),
            Expr::Binary { op, lhs, rhs, .. } => {
                let left = self.lower_expr(lhs)?;
                let right = self.lower_expr(rhs)?;
                if op.is_logical() {
                    Ok(format!("({}) {} ({})", left, op.as_sql(), right))
                } else {
                    Ok(format!("{} {} {}", left, op.as_sql(), right))
                }
            }
            Expr::Group { inner, .. } => Ok(format!("({})", self.lower_expr(inner)?)),
            Expr::Quantifier {
                receiver,
                kind,
                binding,
                predicate,
                span,
            } => self.lower_quantifier(receiver, *kind, binding, predicate, *span),
            Expr::Includes {
                receiver,
                value,
                span,
            } => self.lower_includes(receiver, value, *span),
        }
    }

    // ==================== Member chains ====================

    /// Flatten `root.a.b.c` into the root identifier and the property path.
    fn flatten<'e>(expr: &'e Expr) -> Option<(&'e laforge_schema::Ident, Vec<&'e laforge_schema::Ident>)> {
        match expr {
            Expr::Ident(ident) => Some((ident, vec![])),
            Expr::Member {
                object, property, ..
            } => {
                let (root, mut path) = Self::flatten(object)?;
                path.push(property);
                Some((root, path))
            }
            _ => None,
        }
    }

    fn lower_member(&mut self, expr: &Expr) -> PolicyResult<String> {
        let Some((root, path)) = Self::flatten(expr) else {
            return Err(PolicyError::NotAScalar {
                name: "expression".to_string(),
                span: expr.span(),
            });
        };

        let scope = match self.resolve(root.as_str()) {
            Some(scope) => scope.clone(),
            None => {
                return Err(PolicyError::UnknownIdentifier {
                    name: root.to_string(),
                    span: root.span,
                });
            }
        };

        match scope {
            Scope::User => self.lower_user_access(&path),
            Scope::Row {
                model_index,
                prefix,
            } => self.lower_row_access(model_index, &prefix, &path, expr.span()),
        }
    }

    fn lower_user_access(&self, path: &[&laforge_schema::Ident]) -> PolicyResult<String> {
        let accessor = path.first().expect("member access has a property");
        if path.len() > 1 {
            return Err(PolicyError::NotAScalar {
                name: format!("user.{}", accessor),
                span: path[1].span,
            });
        }
        match accessor.as_str() {
            "id" => Ok(USER_ID_SQL.to_string()),
            "tenantId" => Ok(TENANT_ID_SQL.to_string()),
            "role" => Ok(ROLE_SQL.to_string()),
            other => Err(PolicyError::UnknownUserAccessor {
                accessor: other.to_string(),
                span: accessor.span,
            }),
        }
    }

    /// Walk a property path rooted at a row: scalar fields terminate the
    /// chain, belongsTo relations extend it, collections are a misuse.
    fn lower_row_access(
        &self,
        model_index: usize,
        prefix: &str,
        path: &[&laforge_schema::Ident],
        span: Span,
    ) -> PolicyResult<String> {
        let mut current = self.model_at(model_index);
        let mut hops: Vec<&Relation> = vec![];

        for (i, prop) in path.iter().enumerate() {
            let last = i + 1 == path.len();

            if let Some(field) = current.get_field(prop.as_str()) {
                if !last {
                    return Err(PolicyError::NotAScalar {
                        name: format!("{}.{}", current.name(), field.name()),
                        span: path[i + 1].span,
                    });
                }
                return if hops.is_empty() {
                    Ok(format!("{}{}", prefix, names::column_name(field.name())))
                } else {
                    self.chain_subquery(&hops, &names::column_name(field.name()), prefix, span)
                };
            }

            if let Some(rel) = current.get_relation(prop.as_str()) {
                if rel.kind.is_collection() {
                    return Err(PolicyError::CollectionMisuse {
                        relation: rel.name().to_string(),
                        span: prop.span,
                    });
                }
                if last {
                    return Err(PolicyError::NotAScalar {
                        name: format!("{}.{}", current.name(), rel.name()),
                        span: prop.span,
                    });
                }
                hops.push(rel);
                current = self
                    .domain
                    .relation_target(rel)
                    .expect("validated relation target");
                continue;
            }

            return Err(PolicyError::UnknownProperty {
                property: prop.to_string(),
                model: current.name().to_string(),
                span: prop.span,
            });
        }

        // bare row reference: the loop always returns or errors first
        Err(PolicyError::NotAScalar {
            name: self.model_at(model_index).name().to_string(),
            span,
        })
    }

    /// Emit a correlated scalar subquery over a belongsTo chain.
    ///
    /// Join aliases are `j0, j1, j2`; the chain is bounded at
    /// [`MAX_CHAIN_DEPTH`] hops.
    fn chain_subquery(
        &self,
        hops: &[&Relation],
        terminal_column: &str,
        prefix: &str,
        span: Span,
    ) -> PolicyResult<String> {
        if hops.len() > MAX_CHAIN_DEPTH {
            return Err(PolicyError::ChainTooDeep {
                max: MAX_CHAIN_DEPTH,
                span,
            });
        }

        let first_target = self
            .domain
            .relation_target(hops[0])
            .expect("validated relation target");

        let mut sql = format!(
            "(SELECT j{}.{} FROM {} j0",
            hops.len() - 1,
            terminal_column,
            names::qualified_table(first_target.name()),
        );

        for (k, hop) in hops.iter().enumerate().skip(1) {
            let target = self
                .domain
                .relation_target(hop)
                .expect("validated relation target");
            sql.push_str(&format!(
                " JOIN {} j{} ON j{}.{} = j{}.{}",
                names::qualified_table(target.name()),
                k,
                k,
                self.primary_key_column(target, span)?,
                k - 1,
                names::column_name(&hop.foreign_key),
            ));
        }

        sql.push_str(&format!(
            " WHERE j0.{} = {}{})",
            self.primary_key_column(first_target, span)?,
            prefix,
            names::column_name(&hops[0].foreign_key),
        ));

        Ok(sql)
    }

    // ==================== Collections ====================

    /// Resolve a quantifier/includes receiver to its collection relation.
    /// Receivers must be a collection relation accessed directly on a row
    /// in scope (`record.comments`, `c.replies`).
    fn resolve_collection(
        &self,
        receiver: &Expr,
        method: &str,
    ) -> PolicyResult<(String, usize, Relation)> {
        let misuse = || PolicyError::CollectionRequired {
            method: method.to_string(),
            span: receiver.span(),
        };

        let Expr::Member {
            object, property, ..
        } = receiver
        else {
            return Err(misuse());
        };
        let Expr::Ident(root) = object.as_ref() else {
            return Err(misuse());
        };

        let Some(scope) = self.resolve(root.as_str()) else {
            return Err(PolicyError::UnknownIdentifier {
                name: root.to_string(),
                span: root.span,
            });
        };
        let Scope::Row {
            model_index,
            prefix,
        } = scope
        else {
            return Err(misuse());
        };

        let model = self.model_at(*model_index);
        let Some(rel) = model.get_relation(property.as_str()) else {
            return Err(PolicyError::UnknownProperty {
                property: property.to_string(),
                model: model.name().to_string(),
                span: property.span,
            });
        };
        if !rel.kind.is_collection() {
            return Err(misuse());
        }

        Ok((prefix.clone(), *model_index, rel.clone()))
    }

    fn lower_quantifier(
        &mut self,
        receiver: &Expr,
        kind: QuantifierKind,
        binding: &laforge_schema::Ident,
        predicate: &Expr,
        span: Span,
    ) -> PolicyResult<String> {
        let (owner_prefix, owner_index, rel) = self.resolve_collection(receiver, kind.as_str())?;
        let owner = self.model_at(owner_index);
        let target_index = rel.target_index.expect("validated relation target");
        let target = self.model_at(target_index);

        let k = self.quantifier_depth;
        let alias = format!("s{}", k);
        let owner_pk_ref = format!(
            "{}{}",
            owner_prefix,
            self.primary_key_column(owner, span)?
        );

        // lower the predicate with the element bound to the subquery row
        self.bind(
            binding.name.clone(),
            Scope::Row {
                model_index: target_index,
                prefix: format!("{}.", alias),
            },
        );
        self.quantifier_depth += 1;
        let predicate_sql = self.lower_expr(predicate);
        self.quantifier_depth -= 1;
        self.bindings.pop();
        let predicate_sql = predicate_sql?;

        let negate = match kind {
            QuantifierKind::Some => "",
            QuantifierKind::Every => "NOT ",
        };
        let exists = match kind {
            QuantifierKind::Some => "EXISTS",
            QuantifierKind::Every => "NOT EXISTS",
        };

        match rel.kind {
            RelationKind::HasMany => Ok(format!(
                "{} (SELECT 1 FROM {} {} WHERE {}.{} = {} AND {}({}))",
                exists,
                names::qualified_table(target.name()),
                alias,
                alias,
                names::column_name(&rel.foreign_key),
                owner_pk_ref,
                negate,
                predicate_sql,
            )),
            RelationKind::ManyToMany => {
                let through = rel.through.as_deref().ok_or_else(|| {
                    PolicyError::MissingThrough {
                        relation: rel.name().to_string(),
                        span,
                    }
                })?;
                let join_alias = format!("{}j", alias);
                let target_fk = names::column_name(&names::owner_foreign_key(target));
                Ok(format!(
                    "{} (SELECT 1 FROM public.{} {} JOIN {} {} ON {}.{} = {}.{} WHERE {}.{} = {} AND {}({}))",
                    exists,
                    through,
                    join_alias,
                    names::qualified_table(target.name()),
                    alias,
                    alias,
                    self.primary_key_column(target, span)?,
                    join_alias,
                    target_fk,
                    join_alias,
                    names::column_name(&rel.foreign_key),
                    owner_pk_ref,
                    negate,
                    predicate_sql,
                ))
            }
            RelationKind::BelongsTo => unreachable!("collection receivers are never belongsTo"),
        }
    }

    fn lower_includes(
        &mut self,
        receiver: &Expr,
        value: &Expr,
        span: Span,
    ) -> PolicyResult<String> {
        let (owner_prefix, owner_index, rel) = self.resolve_collection(receiver, "includes")?;
        let owner = self.model_at(owner_index);
        let target_index = rel.target_index.expect("validated relation target");
        let target = self.model_at(target_index);

        let value_sql = self.lower_expr(value)?;
        let alias = format!("s{}", self.quantifier_depth);
        let owner_pk_ref = format!(
            "{}{}",
            owner_prefix,
            self.primary_key_column(owner, span)?
        );

        match rel.kind {
            RelationKind::HasMany => Ok(format!(
                "{} IN (SELECT {}.{} FROM {} {} WHERE {}.{} = {})",
                value_sql,
                alias,
                self.primary_key_column(target, span)?,
                names::qualified_table(target.name()),
                alias,
                alias,
                names::column_name(&rel.foreign_key),
                owner_pk_ref,
            )),
            RelationKind::ManyToMany => {
                let through = rel.through.as_deref().ok_or_else(|| {
                    PolicyError::MissingThrough {
                        relation: rel.name().to_string(),
                        span,
                    }
                })?;
                let join_alias = format!("{}j", alias);
                let target_fk = names::column_name(&names::owner_foreign_key(target));
                Ok(format!(
                    "{} IN (SELECT {}.{} FROM public.{} {} WHERE {}.{} = {})",
                    value_sql,
                    join_alias,
                    target_fk,
                    through,
                    join_alias,
                    join_alias,
                    names::column_name(&rel.foreign_key),
                    owner_pk_ref,
                ))
            }
            RelationKind::BelongsTo => unreachable!("collection receivers are never belongsTo"),
        }
    }
}

/// Render a string literal with single quotes, doubling embedded quotes.
fn quote_str(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
