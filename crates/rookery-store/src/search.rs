//! Query evaluation over the index.
//!
//! Every query reduces to the two set primitives: union within a field
//! (alternative constraints, listed ids, listed relation names) and
//! intersection across sub-constraints and across fields. The cursor bitmap
//! of live rows is always an intersection operand, so tombstoned rows never
//! surface. A field the caller did not constrain contributes no operand at
//! all; an all-absent query is the whole cursor.
//!
//! Predicates run last, after the index has already narrowed the candidates,
//! because they dereference a string per candidate row.

use roaring::RoaringBitmap;

use crate::index::{NodeField, TripleIndex};
use crate::metrics::SearchMetrics;
use crate::query::{NodeConstraint, NormalizedQuery, RelationConstraint};
use crate::sets;

/// Rows in `cursor` matched by the query.
pub(crate) fn matching_rows(
    index: &TripleIndex,
    cursor: &RoaringBitmap,
    metrics: &SearchMetrics,
    query: &NormalizedQuery,
) -> RoaringBitmap {
    let mut per_field: Vec<RoaringBitmap> = Vec::new();

    if let Some(constraints) = &query.source {
        per_field.push(node_matches(index, cursor, metrics, NodeField::Source, constraints));
    }
    if let Some(constraint) = &query.relation {
        per_field.push(relation_matches(index, cursor, metrics, constraint));
    }
    if let Some(constraints) = &query.target {
        per_field.push(node_matches(index, cursor, metrics, NodeField::Target, constraints));
    }

    if per_field.is_empty() {
        return cursor.clone();
    }

    let mut operands: Vec<&RoaringBitmap> = vec![cursor];
    operands.extend(per_field.iter());
    sets::intersection(metrics, &operands)
}

/// Union over the field's alternative constraints.
fn node_matches(
    index: &TripleIndex,
    cursor: &RoaringBitmap,
    metrics: &SearchMetrics,
    field: NodeField,
    constraints: &[NodeConstraint],
) -> RoaringBitmap {
    let mut matched = RoaringBitmap::new();
    for constraint in constraints {
        let rows = constraint_matches(index, cursor, metrics, field, constraint);
        sets::union_into(&mut matched, &rows);
    }
    matched
}

/// One node constraint: kind exact, id any-of, qs all-of, predicate last.
/// Bails to the empty set the moment any named sub-constraint has zero
/// candidates.
fn constraint_matches(
    index: &TripleIndex,
    cursor: &RoaringBitmap,
    metrics: &SearchMetrics,
    field: NodeField,
    constraint: &NodeConstraint,
) -> RoaringBitmap {
    let id_union: RoaringBitmap;
    let mut operands: Vec<&RoaringBitmap> = vec![cursor];

    if let Some(kind) = &constraint.kind {
        let Some(bucket) = index.kind_set(field, kind) else {
            return RoaringBitmap::new();
        };
        operands.push(bucket);
    }

    if let Some(ids) = &constraint.id {
        let mut union = RoaringBitmap::new();
        for id in ids.as_slice() {
            if let Some(bucket) = index.id_set(field, id) {
                sets::union_into(&mut union, bucket);
            }
        }
        if union.is_empty() {
            return RoaringBitmap::new();
        }
        id_union = union;
        operands.push(&id_union);
    }

    for (key, value) in &constraint.qs {
        let Some(bucket) = index.qs_set(field, key, value) else {
            return RoaringBitmap::new();
        };
        operands.push(bucket);
    }

    let matched = sets::intersection(metrics, &operands);

    match &constraint.predicate {
        Some(predicate) => filter_rows(&matched, |row| {
            index
                .node_value(row, field)
                .is_some_and(|value| predicate(value))
        }),
        None => matched,
    }
}

/// Union over the listed relation names, scoped to the cursor, then the
/// optional predicate.
fn relation_matches(
    index: &TripleIndex,
    cursor: &RoaringBitmap,
    metrics: &SearchMetrics,
    constraint: &RelationConstraint,
) -> RoaringBitmap {
    let mut union = RoaringBitmap::new();
    for name in constraint.relation.as_slice() {
        if let Some(bucket) = index.relation_set(name) {
            sets::union_into(&mut union, bucket);
        }
    }

    let matched = sets::intersection(metrics, &[cursor, &union]);

    match &constraint.predicate {
        Some(predicate) => filter_rows(&matched, |row| {
            index
                .relation_value(row)
                .is_some_and(|value| predicate(value))
        }),
        None => matched,
    }
}

fn filter_rows(rows: &RoaringBitmap, mut keep: impl FnMut(u32) -> bool) -> RoaringBitmap {
    let mut kept = RoaringBitmap::new();
    for row in rows {
        if keep(row) {
            kept.insert(row);
        }
    }
    kept
}
