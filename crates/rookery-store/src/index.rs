//! The indexed triple table.
//!
//! Rows live in an append-only slot array; deleting a row tombstones its slot
//! rather than splicing, so every row index ever handed out stays valid and
//! the secondary maps never need renumbering. Seven secondary maps bucket row
//! indices by interned field value:
//!
//! - source kind / source id / source `key=value` pair
//! - relation
//! - target kind / target id / target `key=value` pair
//!
//! A fixed-seed 64-bit content hash per triple rejects duplicates and locates
//! the row to delete. URN decompositions are memoized per distinct string.

use ahash::AHashMap;
use roaring::RoaringBitmap;

use crate::hash::triple_hash;
use crate::interner::{StrId, StringInterner};
use crate::metrics::IndexMetrics;
use crate::triple::Triple;
use crate::urn::{self, ParsedUrn};

/// Which node position of a triple an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Source,
    Target,
}

/// Interned codes for one stored triple.
#[derive(Debug, Clone)]
struct Row {
    source: StrId,
    relation: StrId,
    target: StrId,
}

/// Bucket membership recorded at insert time, so delete clears the row from
/// every bucket it joined without recomputing decompositions.
#[derive(Debug, Clone)]
struct RowMeta {
    hash: u64,
    source_kind: StrId,
    source_id: StrId,
    source_qs: Vec<StrId>,
    relation: StrId,
    target_kind: StrId,
    target_id: StrId,
    target_qs: Vec<StrId>,
}

#[derive(Debug, Clone, Default)]
pub struct TripleIndex {
    rows: Vec<Option<Row>>,
    meta: AHashMap<u32, RowMeta>,
    row_by_hash: AHashMap<u64, u32>,
    strings: StringInterner,
    source_kind: AHashMap<StrId, RoaringBitmap>,
    source_id: AHashMap<StrId, RoaringBitmap>,
    source_qs: AHashMap<StrId, RoaringBitmap>,
    relation: AHashMap<StrId, RoaringBitmap>,
    target_kind: AHashMap<StrId, RoaringBitmap>,
    target_id: AHashMap<StrId, RoaringBitmap>,
    target_qs: AHashMap<StrId, RoaringBitmap>,
    urn_cache: AHashMap<String, ParsedUrn>,
    metrics: IndexMetrics,
}

impl TripleIndex {
    pub fn new(triples: &[Triple]) -> Self {
        let mut index = Self::default();
        index.add(triples);
        index
    }

    /// Insert a batch, silently skipping triples already present. Returns the
    /// row indices of the rows actually appended.
    pub fn add(&mut self, triples: &[Triple]) -> Vec<u32> {
        let mut appended = Vec::new();

        for triple in triples {
            let hash = triple_hash(&triple.source, &triple.relation, &triple.target);
            if self.row_by_hash.contains_key(&hash) {
                continue;
            }

            let source_urn = self.decompose_cached(&triple.source);
            let target_urn = self.decompose_cached(&triple.target);

            let row_index = self.rows.len() as u32;
            let row = Row {
                source: self.strings.intern(&triple.source),
                relation: self.strings.intern(&triple.relation),
                target: self.strings.intern(&triple.target),
            };

            let source_kind = self.strings.intern(&source_urn.kind);
            let source_id = self.strings.intern(&source_urn.id);
            let target_kind = self.strings.intern(&target_urn.kind);
            let target_id = self.strings.intern(&target_urn.id);

            let mut source_qs = Vec::with_capacity(source_urn.qs.len());
            for (key, value) in &source_urn.qs {
                source_qs.push(self.strings.intern(&format!("{key}={value}")));
            }
            let mut target_qs = Vec::with_capacity(target_urn.qs.len());
            for (key, value) in &target_urn.qs {
                target_qs.push(self.strings.intern(&format!("{key}={value}")));
            }

            let meta = RowMeta {
                hash,
                source_kind,
                source_id,
                source_qs,
                relation: row.relation,
                target_kind,
                target_id,
                target_qs,
            };

            bucket_insert(&mut self.source_kind, meta.source_kind, row_index);
            bucket_insert(&mut self.source_id, meta.source_id, row_index);
            for &pair in &meta.source_qs {
                bucket_insert(&mut self.source_qs, pair, row_index);
            }
            bucket_insert(&mut self.relation, meta.relation, row_index);
            bucket_insert(&mut self.target_kind, meta.target_kind, row_index);
            bucket_insert(&mut self.target_id, meta.target_id, row_index);
            for &pair in &meta.target_qs {
                bucket_insert(&mut self.target_qs, pair, row_index);
            }

            self.rows.push(Some(row));
            self.meta.insert(row_index, meta);
            self.row_by_hash.insert(hash, row_index);
            appended.push(row_index);
        }

        appended
    }

    /// Delete a batch. Absent triples are a no-op. Returns the row indices of
    /// the slots tombstoned.
    pub fn delete(&mut self, triples: &[Triple]) -> Vec<u32> {
        let mut removed = Vec::new();

        for triple in triples {
            let hash = triple_hash(&triple.source, &triple.relation, &triple.target);
            let Some(row_index) = self.row_by_hash.remove(&hash) else {
                continue;
            };
            let Some(meta) = self.meta.remove(&row_index) else {
                continue;
            };

            bucket_remove(&mut self.source_kind, meta.source_kind, row_index);
            bucket_remove(&mut self.source_id, meta.source_id, row_index);
            for &pair in &meta.source_qs {
                bucket_remove(&mut self.source_qs, pair, row_index);
            }
            bucket_remove(&mut self.relation, meta.relation, row_index);
            bucket_remove(&mut self.target_kind, meta.target_kind, row_index);
            bucket_remove(&mut self.target_id, meta.target_id, row_index);
            for &pair in &meta.target_qs {
                bucket_remove(&mut self.target_qs, pair, row_index);
            }

            self.rows[row_index as usize] = None;
            removed.push(row_index);
        }

        removed
    }

    pub fn has_triple(&self, triple: &Triple) -> bool {
        self.row_of(triple).is_some()
    }

    /// Row index of an exact triple, if stored.
    pub fn row_of(&self, triple: &Triple) -> Option<u32> {
        let hash = triple_hash(&triple.source, &triple.relation, &triple.target);
        self.row_by_hash.get(&hash).copied()
    }

    /// The subset of `triples` not present in the index.
    pub fn difference(&self, triples: &[Triple]) -> Vec<Triple> {
        triples
            .iter()
            .filter(|triple| !self.has_triple(triple))
            .cloned()
            .collect()
    }

    /// De-interned triple at a row; `None` for out-of-range or tombstoned.
    pub fn triple(&self, row_index: u32) -> Option<Triple> {
        let row = self.rows.get(row_index as usize)?.as_ref()?;
        Some(Triple::new(
            self.strings.lookup(row.source)?,
            self.strings.lookup(row.relation)?,
            self.strings.lookup(row.target)?,
        ))
    }

    /// All live triples, in slot order.
    pub fn triples(&self) -> Vec<Triple> {
        (0..self.rows.len() as u32)
            .filter_map(|row_index| self.triple(row_index))
            .collect()
    }

    /// Live triple count.
    pub fn len(&self) -> usize {
        self.row_by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_by_hash.is_empty()
    }

    /// Slot count including tombstones; the next appended row lands here.
    pub fn slot_count(&self) -> usize {
        self.rows.len()
    }

    pub fn source_kind_set(&self, kind: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.source_kind.get(&self.strings.id_of(kind)?)
    }

    pub fn source_id_set(&self, id: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.source_id.get(&self.strings.id_of(id)?)
    }

    pub fn source_qs_set(&self, key: &str, value: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.source_qs
            .get(&self.strings.id_of(&format!("{key}={value}"))?)
    }

    pub fn relation_set(&self, relation: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.relation.get(&self.strings.id_of(relation)?)
    }

    pub fn target_kind_set(&self, kind: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.target_kind.get(&self.strings.id_of(kind)?)
    }

    pub fn target_id_set(&self, id: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.target_id.get(&self.strings.id_of(id)?)
    }

    pub fn target_qs_set(&self, key: &str, value: &str) -> Option<&RoaringBitmap> {
        self.metrics.record_read();
        self.target_qs
            .get(&self.strings.id_of(&format!("{key}={value}"))?)
    }

    pub(crate) fn kind_set(&self, field: NodeField, kind: &str) -> Option<&RoaringBitmap> {
        match field {
            NodeField::Source => self.source_kind_set(kind),
            NodeField::Target => self.target_kind_set(kind),
        }
    }

    pub(crate) fn id_set(&self, field: NodeField, id: &str) -> Option<&RoaringBitmap> {
        match field {
            NodeField::Source => self.source_id_set(id),
            NodeField::Target => self.target_id_set(id),
        }
    }

    pub(crate) fn qs_set(
        &self,
        field: NodeField,
        key: &str,
        value: &str,
    ) -> Option<&RoaringBitmap> {
        match field {
            NodeField::Source => self.source_qs_set(key, value),
            NodeField::Target => self.target_qs_set(key, value),
        }
    }

    /// Source or target string of a live row, for predicate filtering.
    pub(crate) fn node_value(&self, row_index: u32, field: NodeField) -> Option<&str> {
        let row = self.rows.get(row_index as usize)?.as_ref()?;
        match field {
            NodeField::Source => self.strings.lookup(row.source),
            NodeField::Target => self.strings.lookup(row.target),
        }
    }

    pub(crate) fn relation_value(&self, row_index: u32) -> Option<&str> {
        let row = self.rows.get(row_index as usize)?.as_ref()?;
        self.strings.lookup(row.relation)
    }

    /// Distinct source strings of live rows, first-seen order.
    pub fn sources(&self) -> Vec<String> {
        self.distinct(|row| row.source)
    }

    pub fn relations(&self) -> Vec<String> {
        self.distinct(|row| row.relation)
    }

    pub fn targets(&self) -> Vec<String> {
        self.distinct(|row| row.target)
    }

    fn distinct(&self, pick: impl Fn(&Row) -> StrId) -> Vec<String> {
        let mut seen = ahash::AHashSet::new();
        let mut out = Vec::new();
        for row in self.rows.iter().flatten() {
            let id = pick(row);
            if seen.insert(id) {
                if let Some(value) = self.strings.lookup(id) {
                    out.push(value.to_string());
                }
            }
        }
        out
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    /// Memoized URN decomposition, keyed by the original string.
    fn decompose_cached(&mut self, value: &str) -> ParsedUrn {
        if let Some(parsed) = self.urn_cache.get(value) {
            return parsed.clone();
        }
        let parsed = urn::decompose(value);
        self.urn_cache.insert(value.to_string(), parsed.clone());
        parsed
    }
}

fn bucket_insert(map: &mut AHashMap<StrId, RoaringBitmap>, key: StrId, row_index: u32) {
    map.entry(key).or_default().insert(row_index);
}

fn bucket_remove(map: &mut AHashMap<StrId, RoaringBitmap>, key: StrId, row_index: u32) {
    if let Some(bucket) = map.get_mut(&key) {
        bucket.remove(row_index);
    }
}
