//! Semantic validation for parsed domains.
//!
//! The validator enforces the model invariants before anything is emitted:
//! - exactly one primary key per model, at most one tenant field
//! - relation targets resolve to declared models (and become indices)
//! - belongsTo foreign keys exist and match the target's primary key type
//! - no belongsTo cycle in the relation graph
//! - policy actions are unique per model
//!
//! It also fills in defaulted foreign keys: `<relationName>Id` for
//! belongsTo, `<owningModel>Id` (lower-first) for hasMany and manyToMany.

use tracing::debug;

use crate::ast::*;
use crate::error::{SchemaError, SchemaResult};
use crate::names;

/// Domain validator. Collects all errors before failing.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<SchemaError>,
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a parsed domain, returning the canonical Model AST or the
    /// collected errors.
    pub fn validate(&mut self, mut domain: Domain) -> SchemaResult<Domain> {
        self.errors.clear();

        self.resolve_relations(&mut domain);

        for model in domain.iter() {
            self.check_keys(model);
            self.check_policies(model);
            self.check_foreign_keys(model, &domain);
        }

        self.check_cycles(&domain);

        if self.errors.is_empty() {
            debug!(models = domain.len(), "domain validated");
            Ok(domain)
        } else {
            Err(SchemaError::ValidationFailed {
                count: self.errors.len(),
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    /// Resolve relation targets to model indices and fill defaulted
    /// foreign keys.
    fn resolve_relations(&mut self, domain: &mut Domain) {
        let indices: Vec<(usize, Vec<usize>)> = domain
            .iter()
            .enumerate()
            .map(|(i, m)| (i, (0..m.relations.len()).collect()))
            .collect();

        for (model_idx, relation_idxs) in indices {
            for rel_idx in relation_idxs {
                let (model_name, rel_name, owner_fk) = {
                    let model = domain.model_at(model_idx).expect("index in range");
                    let rel = &model.relations[rel_idx];
                    (
                        model.name.clone(),
                        rel.name.clone(),
                        names::owner_foreign_key(model),
                    )
                };

                let target_index = {
                    let model = domain.model_at(model_idx).expect("index in range");
                    domain.model_index(model.relations[rel_idx].target.as_str())
                };

                let model = domain
                    .models
                    .get_index_mut(model_idx)
                    .map(|(_, m)| m)
                    .expect("index in range");
                let rel = &mut model.relations[rel_idx];

                match target_index {
                    Some(index) => rel.target_index = Some(index),
                    None => {
                        self.errors.push(SchemaError::UnknownRelationTarget {
                            model: model_name.to_string(),
                            relation: rel_name.to_string(),
                            target: rel.target.to_string(),
                        });
                        continue;
                    }
                }

                if rel.foreign_key.is_empty() {
                    rel.foreign_key = match rel.kind {
                        RelationKind::BelongsTo => format!("{}Id", rel.name()).into(),
                        RelationKind::HasMany | RelationKind::ManyToMany => owner_fk.clone().into(),
                    };
                }
            }
        }
    }

    fn check_keys(&mut self, model: &Model) {
        let pk_count = model.fields.values().filter(|f| f.primary_key).count();
        if pk_count == 0 {
            self.errors.push(SchemaError::MissingPrimaryKey {
                model: model.name().to_string(),
            });
        } else if pk_count > 1 {
            self.errors.push(SchemaError::MultiplePrimaryKeys {
                model: model.name().to_string(),
            });
        }

        let tenant_count = model.fields.values().filter(|f| f.tenant).count();
        if tenant_count > 1 {
            self.errors.push(SchemaError::MultipleTenantFields {
                model: model.name().to_string(),
            });
        }
    }

    fn check_policies(&mut self, model: &Model) {
        let mut seen = Vec::with_capacity(model.policies.len());
        for policy in &model.policies {
            if seen.contains(&policy.action) {
                self.errors.push(SchemaError::DuplicatePolicy {
                    model: model.name().to_string(),
                    action: policy.action.as_str().to_string(),
                });
            } else {
                seen.push(policy.action);
            }
        }
    }

    /// belongsTo foreign keys must name a scalar field of the owning model
    /// whose type matches the target's primary key type.
    fn check_foreign_keys(&mut self, model: &Model, domain: &Domain) {
        for rel in &model.relations {
            if rel.kind != RelationKind::BelongsTo {
                continue;
            }
            let Some(target) = domain.relation_target(rel) else {
                continue; // already reported as unresolved
            };

            let Some(fk_field) = model.get_field(rel.foreign_key.as_str()) else {
                self.errors.push(SchemaError::UnknownForeignKey {
                    model: model.name().to_string(),
                    relation: rel.name().to_string(),
                    foreign_key: rel.foreign_key.to_string(),
                });
                continue;
            };

            if let Some(target_pk) = target.primary_key()
                && fk_field.ty != target_pk.ty
            {
                self.errors.push(SchemaError::ForeignKeyTypeMismatch {
                    model: model.name().to_string(),
                    relation: rel.name().to_string(),
                    foreign_key: rel.foreign_key.to_string(),
                    found: fk_field.ty.as_str().to_string(),
                    target: target.name().to_string(),
                    expected: target_pk.ty.as_str().to_string(),
                });
            }
        }
    }

    /// Depth-first search over belongsTo edges. Any back edge is a cycle.
    fn check_cycles(&mut self, domain: &Domain) {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        let n = domain.len();
        let mut color = vec![WHITE; n];

        fn visit(
            domain: &Domain,
            index: usize,
            color: &mut [u8],
            stack: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            color[index] = GRAY;
            stack.push(index);

            let model = domain.model_at(index).expect("index in range");
            for rel in &model.relations {
                if rel.kind != RelationKind::BelongsTo {
                    continue;
                }
                let Some(next) = rel.target_index else {
                    continue;
                };
                match color[next] {
                    GRAY => {
                        // cycle: slice the stack from the first occurrence
                        let start = stack.iter().position(|&i| i == next).unwrap_or(0);
                        let mut path = stack[start..].to_vec();
                        path.push(next);
                        return Some(path);
                    }
                    WHITE => {
                        if let Some(path) = visit(domain, next, color, stack) {
                            return Some(path);
                        }
                    }
                    _ => {}
                }
            }

            stack.pop();
            color[index] = BLACK;
            None
        }

        for index in 0..n {
            if color[index] == WHITE {
                let mut stack = vec![];
                if let Some(path) = visit(domain, index, &mut color, &mut stack) {
                    let names: Vec<&str> = path
                        .iter()
                        .filter_map(|&i| domain.model_at(i).map(|m| m.name()))
                        .collect();
                    self.errors.push(SchemaError::RelationCycle {
                        path: names.join(" -> "),
                    });
                    return; // one cycle report is enough
                }
            }
        }
    }
}

/// Parse and validate a domain file in one step.
pub fn compile_domain(input: &str) -> SchemaResult<Domain> {
    let domain = crate::parser::parse_domain(input)?;
    Validator::new().validate(domain)
}
