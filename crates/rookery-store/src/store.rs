//! The store facade: lifecycle, search, and record reconstruction.
//!
//! A store owns one [`TripleIndex`] and one cursor bitmap of live rows, kept
//! in lock-step by `add` and `delete`. Searches dereference the matched rows
//! and wrap them in a fresh store: results are independent snapshots, never
//! views. Isolation of a whole store is `deep_clone`; cheap sharing is a
//! plain `&TripleStore` borrow.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ahash::AHashSet;
use roaring::RoaringBitmap;
use thiserror::Error;

use crate::index::TripleIndex;
use crate::metrics::SearchMetrics;
use crate::query::Query;
use crate::search;
use crate::triple::{Triple, TripleObject};
use crate::urn;

/// Per-relation check of `(source_kind, relation, target)`; a returned
/// message is a complaint, `None` is acceptance.
pub type TargetValidator = Arc<dyn Fn(&str, &str, &str) -> Option<String> + Send + Sync>;

/// Validators keyed by the relation name they gate.
pub type ValidatorMap = HashMap<String, TargetValidator>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// One aggregated report per rejected batch; nothing was committed.
    #[error("triple validation failed:\n- {}", .0.join("\n- "))]
    ValidationFailed(Vec<String>),
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] serde_json::Error),
}

/// Options for [`TripleStore::read_thing`]: `qs` widens the lookup to every
/// query-string variant of the URN's kind and id.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOpts {
    pub qs: bool,
}

pub struct TripleStore {
    index: TripleIndex,
    cursor: RoaringBitmap,
    metrics: SearchMetrics,
    validators: ValidatorMap,
}

impl TripleStore {
    pub fn new(triples: &[Triple]) -> Self {
        Self::with_validators(triples, ValidatorMap::new())
    }

    pub fn with_validators(triples: &[Triple], validators: ValidatorMap) -> Self {
        let mut index = TripleIndex::default();
        let mut cursor = RoaringBitmap::new();
        for row in index.add(triples) {
            cursor.insert(row);
        }
        Self {
            index,
            cursor,
            metrics: SearchMetrics::default(),
            validators,
        }
    }

    /// Build a store from record views, one triple per field value.
    pub fn from_objects(objects: &[TripleObject]) -> Self {
        let triples: Vec<Triple> = objects.iter().flat_map(TripleObject::triples).collect();
        Self::new(&triples)
    }

    /// Validate the whole batch, then commit all of it or none of it.
    /// Duplicates of stored triples are dropped silently.
    pub fn add(&mut self, triples: &[Triple]) -> Result<(), StoreError> {
        self.validate(triples)?;
        self.commit(triples);
        Ok(())
    }

    /// Remove triples. Absent triples are a no-op.
    pub fn delete(&mut self, triples: &[Triple]) {
        for row in self.index.delete(triples) {
            self.cursor.remove(row);
        }
    }

    /// Matching triples wrapped in a fresh store carrying the same
    /// validators.
    pub fn search(&self, query: &Query) -> TripleStore {
        let rows = search::matching_rows(&self.index, &self.cursor, &self.metrics, &query.normalize());
        let triples: Vec<Triple> = rows.iter().filter_map(|row| self.index.triple(row)).collect();
        TripleStore::with_validators(&triples, self.validators.clone())
    }

    /// [`search`](Self::search) with the query supplied as JSON; unknown
    /// query keys are rejected before any index access.
    pub fn search_json(&self, query: &str) -> Result<TripleStore, StoreError> {
        let query: Query = serde_json::from_str(query)?;
        Ok(self.search(&query))
    }

    /// Flat-map the matched triples and patch this store in place with only
    /// the difference: triples the transform dropped are deleted, triples it
    /// introduced are added, and triples it left unchanged are not touched.
    /// Validators gate the additions; a failed batch changes nothing.
    pub fn search_and_replace<F>(&mut self, query: &Query, transform: F) -> Result<(), StoreError>
    where
        F: Fn(&Triple) -> Vec<Triple>,
    {
        let rows = search::matching_rows(&self.index, &self.cursor, &self.metrics, &query.normalize());
        let matched: Vec<Triple> = rows.iter().filter_map(|row| self.index.triple(row)).collect();

        let mut produced: Vec<Triple> = Vec::new();
        let mut produced_set: AHashSet<Triple> = AHashSet::new();
        for triple in &matched {
            for out in transform(triple) {
                if produced_set.insert(out.clone()) {
                    produced.push(out);
                }
            }
        }

        let matched_set: AHashSet<&Triple> = matched.iter().collect();
        let to_delete: Vec<Triple> = matched
            .iter()
            .filter(|triple| !produced_set.contains(*triple))
            .cloned()
            .collect();
        let to_add: Vec<Triple> = produced
            .into_iter()
            .filter(|triple| !matched_set.contains(triple))
            .collect();

        self.validate(&to_add)?;
        self.delete(&to_delete);
        self.commit(&to_add);
        Ok(())
    }

    /// A new store from transforming every triple. Validators do not carry
    /// over.
    pub fn map(&self, transform: impl Fn(&Triple) -> Triple) -> TripleStore {
        let triples: Vec<Triple> = self.triples().iter().map(transform).collect();
        TripleStore::new(&triples)
    }

    /// A new store from flat-mapping every triple. `flat_map` with the
    /// identity transform is the isolation idiom: the result shares nothing
    /// with the original.
    pub fn flat_map(&self, transform: impl Fn(&Triple) -> Vec<Triple>) -> TripleStore {
        let triples: Vec<Triple> = self.triples().iter().flat_map(transform).collect();
        TripleStore::new(&triples)
    }

    /// Full structural copy: index, cursor, metrics, and validators.
    pub fn deep_clone(&self) -> TripleStore {
        TripleStore {
            index: self.index.clone(),
            cursor: self.cursor.clone(),
            metrics: self.metrics.clone(),
            validators: self.validators.clone(),
        }
    }

    /// Add all of `other`'s triples; its duplicates drop out naturally.
    pub fn merge(&mut self, other: &TripleStore) -> Result<(), StoreError> {
        self.add(&other.triples())
    }

    /// All live triples, slot order.
    pub fn triples(&self) -> Vec<Triple> {
        self.index.triples()
    }

    /// Live triple count.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has_triple(&self, triple: &Triple) -> bool {
        self.index.has_triple(triple)
    }

    /// The subset of `triples` not stored here.
    pub fn difference(&self, triples: &[Triple]) -> Vec<Triple> {
        self.index.difference(triples)
    }

    pub fn sources(&self) -> Vec<String> {
        self.index.sources()
    }

    pub fn relations(&self) -> Vec<String> {
        self.index.relations()
    }

    pub fn targets(&self) -> Vec<String> {
        self.index.targets()
    }

    pub fn first_triple(&self) -> Option<Triple> {
        self.cursor.min().and_then(|row| self.index.triple(row))
    }

    pub fn first_source(&self) -> Option<String> {
        self.first_triple().map(|triple| triple.source)
    }

    pub fn first_relation(&self) -> Option<String> {
        self.first_triple().map(|triple| triple.relation)
    }

    pub fn first_target(&self) -> Option<String> {
        self.first_triple().map(|triple| triple.target)
    }

    /// Group every live triple by source into record views, first-seen
    /// source order.
    pub fn objects(&self) -> Vec<TripleObject> {
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut out: Vec<TripleObject> = Vec::new();
        for triple in self.triples() {
            let next = out.len();
            let slot = *by_id.entry(triple.source.clone()).or_insert(next);
            if slot == out.len() {
                out.push(TripleObject::new(&triple.source));
            }
            out[slot].push(&triple.relation, &triple.target);
        }
        out
    }

    pub fn first_object(&self) -> Option<TripleObject> {
        self.objects().into_iter().next()
    }

    /// The record for one URN. Exact source-string match by default; with
    /// `opts.qs` every query-string variant of the URN's kind and id
    /// contributes, under the first matching source as id.
    pub fn read_thing(&self, urn: &str, opts: ReadOpts) -> Option<TripleObject> {
        let wanted = opts.qs.then(|| urn::decompose(urn));
        let mut object: Option<TripleObject> = None;

        for triple in self.triples() {
            let matches = match &wanted {
                Some(wanted) => {
                    let parsed = urn::decompose(&triple.source);
                    parsed.kind == wanted.kind && parsed.id == wanted.id
                }
                None => triple.source == urn,
            };
            if matches {
                object
                    .get_or_insert_with(|| TripleObject::new(&triple.source))
                    .push(&triple.relation, &triple.target);
            }
        }

        object
    }

    pub fn read_things<'a>(
        &self,
        urns: impl IntoIterator<Item = &'a str>,
        opts: ReadOpts,
    ) -> Vec<TripleObject> {
        urns.into_iter()
            .filter_map(|urn| self.read_thing(urn, opts))
            .collect()
    }

    /// [`read_thing`](Self::read_thing) through a caller-supplied parser.
    pub fn parse_thing<T>(
        &self,
        parser: impl Fn(&TripleObject) -> Option<T>,
        urn: &str,
        opts: ReadOpts,
    ) -> Option<T> {
        self.read_thing(urn, opts).and_then(|thing| parser(&thing))
    }

    pub fn parse_things<'a, T>(
        &self,
        parser: impl Fn(&TripleObject) -> Option<T>,
        urns: impl IntoIterator<Item = &'a str>,
        opts: ReadOpts,
    ) -> Vec<T> {
        urns.into_iter()
            .filter_map(|urn| self.parse_thing(&parser, urn, opts))
            .collect()
    }

    /// Secondary-map reads performed by the index so far.
    pub fn index_read_count(&self) -> u64 {
        self.index.metrics().map_read_count()
    }

    /// Set-membership checks performed during intersections so far.
    pub fn set_check_count(&self) -> u64 {
        self.metrics.set_check_count()
    }

    fn validate(&self, triples: &[Triple]) -> Result<(), StoreError> {
        let mut messages = Vec::new();
        for triple in triples {
            let Some(validator) = self.validators.get(&triple.relation) else {
                continue;
            };
            let source_kind = urn::decompose(&triple.source).kind;
            if let Some(message) = validator(&source_kind, &triple.relation, &triple.target) {
                messages.push(message);
            }
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(StoreError::ValidationFailed(messages))
        }
    }

    fn commit(&mut self, triples: &[Triple]) {
        for row in self.index.add(triples) {
            self.cursor.insert(row);
        }
    }
}

impl fmt::Debug for TripleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripleStore")
            .field("len", &self.len())
            .field("slots", &self.index.slot_count())
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn birds() -> Vec<Triple> {
        vec![
            Triple::new("urn:ró:bird:rook", "name", "Rook"),
            Triple::new("urn:ró:bird:rook", "genus", "Corvus"),
            Triple::new("urn:ró:bird:magpie", "name", "Magpie"),
        ]
    }

    #[test]
    fn search_results_are_independent_snapshots() {
        let store = TripleStore::new(&birds());
        let mut rooks = store.search(&Query::new().source("urn:ró:bird:rook"));
        assert_eq!(rooks.len(), 2);
        let matched = rooks.triples();
        rooks.delete(&matched);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn validators_reject_whole_batches() {
        let mut validators = ValidatorMap::new();
        validators.insert(
            "age".to_string(),
            Arc::new(|_: &str, _: &str, target: &str| {
                target
                    .parse::<u32>()
                    .is_err()
                    .then(|| format!("age must be a number, got {target:?}"))
            }),
        );
        let mut store = TripleStore::with_validators(&[], validators);

        let result = store.add(&[
            Triple::new("urn:ró:bird:rook", "age", "4"),
            Triple::new("urn:ró:bird:magpie", "age", "several"),
        ]);
        assert!(matches!(result, Err(StoreError::ValidationFailed(ref m)) if m.len() == 1));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn read_thing_widens_over_query_strings_only_on_request() {
        let store = TripleStore::new(&[
            Triple::new("urn:ró:bird:rook", "name", "Rook"),
            Triple::new("urn:ró:bird:rook?photo=1", "in-flight", "true"),
        ]);

        let exact = store
            .read_thing("urn:ró:bird:rook", ReadOpts::default())
            .unwrap();
        assert_eq!(exact.fields.len(), 1);

        let widened = store
            .read_thing("urn:ró:bird:rook", ReadOpts { qs: true })
            .unwrap();
        assert_eq!(widened.fields.len(), 2);
    }

    #[test]
    fn deep_clone_isolates_mutation() {
        let store = TripleStore::new(&birds());
        let mut copy = store.deep_clone();
        copy.delete(&birds());
        assert!(copy.is_empty());
        assert_eq!(store.len(), 3);
    }
}
