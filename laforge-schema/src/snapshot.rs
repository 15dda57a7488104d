//! Structural snapshot of a domain.
//!
//! The snapshot is the persisted form of the last-accepted Model AST, used
//! as the differ's left-hand input on the next incremental run. It is a
//! structural projection: fields and relations only. Spans, hook bodies,
//! and policies are dropped — none of them shape the relational schema —
//! so two domains are equal for migration purposes iff their snapshots are
//! equal.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::ast::*;

/// On-disk layout version. Bump when the serialized shape changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// The serialized snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDoc {
    /// Layout version tag.
    pub version: u32,
    /// Models in declaration order.
    pub models: Vec<SnapshotModel>,
}

/// A model's structural projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotModel {
    /// Model name.
    pub name: SmolStr,
    /// Scalar fields in declaration order.
    pub fields: Vec<SnapshotField>,
    /// Relations in declaration order.
    pub relations: Vec<SnapshotRelation>,
}

/// A field's structural projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotField {
    /// Field name.
    pub name: SmolStr,
    /// Scalar type.
    pub ty: ScalarType,
    /// Nullability.
    pub optional: bool,
    /// Primary key flag.
    pub primary_key: bool,
    /// Tenant flag.
    pub tenant: bool,
    /// Secret flag.
    pub secret: bool,
    /// Raw default literal.
    pub default: Option<SmolStr>,
    /// Residency tag.
    pub residency: Option<SmolStr>,
}

/// A relation's structural projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRelation {
    /// Relation name.
    pub name: SmolStr,
    /// Relation kind.
    pub kind: RelationKind,
    /// Target model name.
    pub target: SmolStr,
    /// Foreign key field name (post-validation, always filled).
    pub foreign_key: SmolStr,
    /// Join table for manyToMany.
    pub through: Option<SmolStr>,
}

impl SnapshotDoc {
    /// Project a validated domain into its snapshot form.
    pub fn project(domain: &Domain) -> Self {
        let models = domain
            .iter()
            .map(|model| SnapshotModel {
                name: model.name.name.clone(),
                fields: model
                    .fields
                    .values()
                    .map(|f| SnapshotField {
                        name: f.name.name.clone(),
                        ty: f.ty,
                        optional: f.optional,
                        primary_key: f.primary_key,
                        tenant: f.tenant,
                        secret: f.secret,
                        default: f.default.clone(),
                        residency: f.residency.clone(),
                    })
                    .collect(),
                relations: model
                    .relations
                    .iter()
                    .map(|r| SnapshotRelation {
                        name: r.name.name.clone(),
                        kind: r.kind,
                        target: r.target.clone(),
                        foreign_key: r.foreign_key.clone(),
                        through: r.through.clone(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            models,
        }
    }

    /// Restore a domain from a snapshot. Spans are synthetic; policies and
    /// hooks are absent. Relation target indices are re-resolved.
    pub fn restore(&self) -> Domain {
        let mut domain = Domain::new();

        for snap in &self.models {
            let mut model = Model::new(
                Ident::new(snap.name.clone(), Span::synthetic()),
                Span::synthetic(),
            );
            for f in &snap.fields {
                let mut field = Field::new(
                    Ident::new(f.name.clone(), Span::synthetic()),
                    f.ty,
                    Span::synthetic(),
                );
                field.optional = f.optional;
                field.primary_key = f.primary_key;
                field.tenant = f.tenant;
                field.secret = f.secret;
                field.default = f.default.clone();
                field.residency = f.residency.clone();
                model.add_field(field);
            }
            for r in &snap.relations {
                let mut relation = Relation::new(
                    Ident::new(r.name.clone(), Span::synthetic()),
                    r.kind,
                    r.target.clone(),
                    Span::synthetic(),
                );
                relation.foreign_key = r.foreign_key.clone();
                relation.through = r.through.clone();
                model.add_relation(relation);
            }
            domain.add_model(model);
        }

        // second pass: resolve indices now that all models exist
        let names: Vec<SmolStr> = domain.models.keys().cloned().collect();
        for name in names {
            let targets: Vec<Option<usize>> = domain
                .get_model(name.as_str())
                .map(|m| {
                    m.relations
                        .iter()
                        .map(|r| domain.model_index(r.target.as_str()))
                        .collect()
                })
                .unwrap_or_default();
            if let Some(model) = domain.get_model_mut(name.as_str()) {
                for (rel, target_index) in model.relations.iter_mut().zip(targets) {
                    rel.target_index = target_index;
                }
            }
        }

        domain
    }
}

/// Structural equality of two domains: projections compared, hook bodies
/// and policies ignored. This equality defines "no migration needed".
pub fn structural_eq(a: &Domain, b: &Domain) -> bool {
    SnapshotDoc::project(a) == SnapshotDoc::project(b)
}
