//! Rookery: an in-memory indexed triple store.
//!
//! Data is `(source, relation, target)` string triples, conventionally
//! addressed by URNs (`urn:<namespace>:<kind>:<id>[?<query>]`). Structured
//! searches by kind, id, query parameters, relation name, and predicate are
//! answered from secondary indices rather than scans.
//!
//! Key pieces:
//! 1. **String interning**: every distinct string stored once, addressed by a
//!    u32 id
//! 2. **Bitmap buckets**: seven secondary maps from interned field values to
//!    Roaring bitmaps of row indices
//! 3. **Tombstoned slots**: rows are append-only and never renumbered, so
//!    bucket contents stay valid across deletes
//! 4. **Set-algebra search**: queries reduce to unions within a field and one
//!    size-sorted, short-circuiting intersection across fields
//! 5. **Line codec**: a compact declare-once text format for piping triples
//!    between processes
//!
//! ## Module organization
//!
//! - `store`: the public facade (lifecycle, search, record reconstruction)
//! - `index`: slot array, secondary maps, content-hash dedup
//! - `query` / `predicates`: query inputs and their normalization
//! - `urn`, `interner`, `sets`, `metrics`, `codec`: the supporting pieces

pub mod codec;
pub mod index;
pub mod interner;
pub mod metrics;
pub mod predicates;
pub mod query;
pub mod sets;
pub mod store;
pub mod triple;
pub mod urn;

mod hash;
mod search;

pub use codec::{CodecError, Decoder, Encoder};
pub use index::{NodeField, TripleIndex};
pub use interner::{StrId, StringInterner};
pub use metrics::{IndexMetrics, SearchMetrics};
pub use query::{
    NodeConstraint, NodePredicate, NodeSearch, OneOrMany, Query, RelationConstraint,
    RelationSearch,
};
pub use store::{ReadOpts, StoreError, TargetValidator, TripleStore, ValidatorMap};
pub use triple::{FieldValue, Triple, TripleObject};
pub use urn::{decompose, decompose_in, is_urn, ParsedUrn, DEFAULT_NAMESPACE, UNKNOWN_KIND};
