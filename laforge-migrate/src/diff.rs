//! Schema diffing between two Model ASTs.
//!
//! The differ compares a previous (snapshot) domain against the current
//! one and produces a minimal, deterministically ordered operation
//! sequence, plus warnings for every heuristic decision and every
//! destructive operation.

use std::collections::BTreeMap;

use laforge_schema::{Domain, Field, Model, RelationKind, names};
use tracing::debug;

use crate::operation::{ColumnSpec, ForeignKeySpec, SchemaOp, columns_of};
use crate::warning::EmissionWarning;

/// The outcome of diffing two domains.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// Ordered operations to apply.
    pub ops: Vec<SchemaOp>,
    /// Heuristic and destructiveness warnings.
    pub warnings: Vec<EmissionWarning>,
}

impl DiffResult {
    /// Whether the domains are structurally identical.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// A short human-readable summary of the plan.
    pub fn summary(&self) -> String {
        if self.ops.is_empty() {
            return "No changes".to_string();
        }
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for op in &self.ops {
            *counts.entry(op.kind_name()).or_default() += 1;
        }
        counts
            .iter()
            .map(|(kind, count)| format!("{} {}", count, kind))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Compute the ordered operation sequence between two domains.
pub fn diff_domains(previous: &Domain, current: &Domain) -> DiffResult {
    let mut ops: Vec<SchemaOp> = vec![];
    let mut warnings: Vec<EmissionWarning> = vec![];

    let removed: Vec<&Model> = previous
        .iter()
        .filter(|m| current.get_model(m.name()).is_none())
        .collect();
    let added: Vec<&Model> = current
        .iter()
        .filter(|m| previous.get_model(m.name()).is_none())
        .collect();

    let renames = detect_table_renames(&removed, &added, &mut warnings);

    // table -> table mapping for carrying the previous FK set forward
    let mut table_map: BTreeMap<String, String> = BTreeMap::new();
    for (from, to) in &renames {
        table_map.insert(
            names::table_name(from.name()),
            names::table_name(to.name()),
        );
    }

    for (from, to) in &renames {
        let from_table = names::table_name(from.name());
        let to_table = names::table_name(to.name());
        warnings.push(EmissionWarning::table_rename(&from_table, &to_table));
        ops.push(SchemaOp::RenameTable {
            from: from_table,
            to: to_table.clone(),
        });
        diff_columns(from, to, &to_table, &mut ops, &mut warnings);
    }

    let renamed_from: Vec<&str> = renames.iter().map(|(from, _)| from.name()).collect();
    let renamed_to: Vec<&str> = renames.iter().map(|(_, to)| to.name()).collect();

    for model in &added {
        if renamed_to.contains(&model.name()) {
            continue;
        }
        ops.push(SchemaOp::AddTable {
            table: names::table_name(model.name()),
            columns: columns_of(model),
        });
    }

    for model in &removed {
        if renamed_from.contains(&model.name()) {
            continue;
        }
        ops.push(SchemaOp::DropTable {
            table: names::table_name(model.name()),
            columns: columns_of(model),
        });
    }

    for model in current.iter() {
        if let Some(prev_model) = previous.get_model(model.name()) {
            let table = names::table_name(model.name());
            diff_columns(prev_model, model, &table, &mut ops, &mut warnings);
        }
    }

    diff_foreign_keys(previous, current, &table_map, &mut ops);

    for op in &ops {
        if op.is_destructive() {
            warnings.push(EmissionWarning::destructive(op));
        }
    }

    order_ops(&mut ops, current);

    debug!(
        ops = ops.len(),
        warnings = warnings.len(),
        "domain diff computed"
    );
    DiffResult { ops, warnings }
}

/// A removed and an added model qualify for a rename when their primary
/// key types match, every field they share by name has an identical
/// signature, and the field counts differ by at most one.
fn rename_compatible(prev: &Model, cur: &Model) -> bool {
    match (prev.primary_key(), cur.primary_key()) {
        (Some(a), Some(b)) if a.ty == b.ty => {}
        _ => return false,
    }

    for (name, prev_field) in &prev.fields {
        if let Some(cur_field) = cur.fields.get(name)
            && prev_field.signature() != cur_field.signature()
        {
            return false;
        }
    }

    prev.fields.len().abs_diff(cur.fields.len()) <= 1
}

/// Pair removed and added models for renaming. A pair is accepted only
/// when the match is mutually unique; anything ambiguous falls back to
/// drop+add with a warning.
fn detect_table_renames<'a>(
    removed: &[&'a Model],
    added: &[&'a Model],
    warnings: &mut Vec<EmissionWarning>,
) -> Vec<(&'a Model, &'a Model)> {
    let mut pairs = vec![];

    for prev in removed {
        let candidates: Vec<&&Model> = added
            .iter()
            .filter(|cur| rename_compatible(prev, cur))
            .collect();

        match candidates.as_slice() {
            [] => {}
            [only] => {
                // the added side must also be unambiguous
                let reverse: usize = removed
                    .iter()
                    .filter(|p| rename_compatible(p, only))
                    .count();
                if reverse == 1 {
                    pairs.push((*prev, **only));
                } else {
                    warnings.push(EmissionWarning::ambiguous_rename(only.name()));
                }
            }
            _ => {
                warnings.push(EmissionWarning::ambiguous_rename(prev.name()));
            }
        }
    }

    pairs
}

/// Column-level diff between two versions of a model.
fn diff_columns(
    prev: &Model,
    cur: &Model,
    table: &str,
    ops: &mut Vec<SchemaOp>,
    warnings: &mut Vec<EmissionWarning>,
) {
    let removed: Vec<&Field> = prev
        .fields
        .values()
        .filter(|f| cur.get_field(f.name()).is_none())
        .collect();
    let added: Vec<&Field> = cur
        .fields
        .values()
        .filter(|f| prev.get_field(f.name()).is_none())
        .collect();

    let shared_unchanged = prev.fields.values().all(|pf| {
        cur.get_field(pf.name())
            .map(|cf| pf.signature() == cf.signature())
            .unwrap_or(true)
    });

    // exactly one out, one in, same type, everything else untouched
    if removed.len() == 1 && added.len() == 1 && removed[0].ty == added[0].ty && shared_unchanged {
        let from = names::column_name(removed[0].name());
        let to = names::column_name(added[0].name());
        warnings.push(EmissionWarning::column_rename(table, &from, &to));
        ops.push(SchemaOp::RenameColumn {
            table: table.to_string(),
            from,
            to: to.clone(),
        });
        push_field_alters(table, &to, removed[0], added[0], ops);
        return;
    }

    for field in added {
        ops.push(SchemaOp::AddColumn {
            table: table.to_string(),
            column: ColumnSpec::from_field(field),
        });
    }
    for field in removed {
        ops.push(SchemaOp::DropColumn {
            table: table.to_string(),
            column: ColumnSpec::from_field(field),
        });
    }

    for cur_field in cur.fields.values() {
        if let Some(prev_field) = prev.get_field(cur_field.name()) {
            let column = names::column_name(cur_field.name());
            push_field_alters(table, &column, prev_field, cur_field, ops);
        }
    }
}

/// Emit the alter operations for one surviving column.
fn push_field_alters(
    table: &str,
    column: &str,
    prev: &Field,
    cur: &Field,
    ops: &mut Vec<SchemaOp>,
) {
    if prev.ty != cur.ty {
        ops.push(SchemaOp::AlterColumnType {
            table: table.to_string(),
            column: column.to_string(),
            from_ty: prev.ty,
            to_ty: cur.ty,
        });
    }
    if prev.optional != cur.optional {
        ops.push(SchemaOp::AlterNullability {
            table: table.to_string(),
            column: column.to_string(),
            ty: cur.ty,
            nullable: cur.optional,
        });
    }
    if prev.default != cur.default {
        ops.push(SchemaOp::AlterDefault {
            table: table.to_string(),
            column: column.to_string(),
            ty: cur.ty,
            to: cur.default.as_ref().map(|d| d.to_string()),
        });
    }
}

/// All foreign keys of a domain, derived from belongsTo relations.
fn foreign_keys(domain: &Domain) -> Vec<ForeignKeySpec> {
    let mut fks = vec![];
    for model in domain.iter() {
        for rel in &model.relations {
            if rel.kind != RelationKind::BelongsTo {
                continue;
            }
            let Some(target) = domain.get_model(rel.target.as_str()) else {
                continue;
            };
            let Some(target_pk) = target.primary_key() else {
                continue;
            };
            fks.push(ForeignKeySpec {
                table: names::table_name(model.name()),
                column: names::column_name(&rel.foreign_key),
                references_table: names::table_name(target.name()),
                references_column: names::column_name(target_pk.name()),
            });
        }
    }
    fks
}

fn diff_foreign_keys(
    previous: &Domain,
    current: &Domain,
    table_map: &BTreeMap<String, String>,
    ops: &mut Vec<SchemaOp>,
) {
    // carry the previous set through table renames so a rename alone does
    // not churn its constraints
    let map = |table: &str| -> String {
        table_map
            .get(table)
            .cloned()
            .unwrap_or_else(|| table.to_string())
    };

    let prev_fks: BTreeMap<(String, String), ForeignKeySpec> = foreign_keys(previous)
        .into_iter()
        .map(|fk| {
            let mapped = ForeignKeySpec {
                table: map(&fk.table),
                references_table: map(&fk.references_table),
                ..fk
            };
            ((mapped.table.clone(), mapped.column.clone()), mapped)
        })
        .collect();

    let cur_fks: BTreeMap<(String, String), ForeignKeySpec> = foreign_keys(current)
        .into_iter()
        .map(|fk| ((fk.table.clone(), fk.column.clone()), fk))
        .collect();

    for (key, fk) in &cur_fks {
        match prev_fks.get(key) {
            None => ops.push(SchemaOp::AddForeignKey { fk: fk.clone() }),
            Some(prev) if prev != fk => ops.push(SchemaOp::AlterForeignKey {
                from: prev.clone(),
                to: fk.clone(),
            }),
            Some(_) => {}
        }
    }

    for (key, fk) in &prev_fks {
        if !cur_fks.contains_key(key) {
            ops.push(SchemaOp::DropForeignKey { fk: fk.clone() });
        }
    }
}

/// Deterministic ordering: group priority first, then the current AST's
/// declaration order, then lexicographic identifiers.
fn order_ops(ops: &mut [SchemaOp], current: &Domain) {
    let decl_order: BTreeMap<String, usize> = current
        .iter()
        .enumerate()
        .map(|(i, m)| (names::table_name(m.name()), i))
        .collect();

    ops.sort_by_cached_key(|op| {
        let group = match op {
            SchemaOp::DropForeignKey { .. } => 0u8,
            SchemaOp::RenameTable { .. } => 1,
            SchemaOp::RenameColumn { .. } => 2,
            SchemaOp::AddTable { .. } => 3,
            SchemaOp::AddColumn { .. } => 4,
            SchemaOp::AlterColumnType { .. } => 5,
            SchemaOp::AlterNullability { .. } => 6,
            SchemaOp::AlterDefault { .. } => 7,
            SchemaOp::DropColumn { .. } => 8,
            SchemaOp::DropTable { .. } => 9,
            SchemaOp::AddForeignKey { .. } => 10,
            SchemaOp::AlterForeignKey { .. } => 11,
        };
        let decl = decl_order
            .get(op.table())
            .copied()
            .unwrap_or(usize::MAX);
        (group, decl, op.describe())
    });
}
