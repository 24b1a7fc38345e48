//! String interning: every distinct string used by the index (sources,
//! targets, relation names, URN kinds/ids, `key=value` query pairs) is stored
//! once and addressed by a compact [`StrId`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Interned string ID (4 bytes instead of 24+ for String)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StrId(u32);

impl StrId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Bidirectional string ↔ [`StrId`] mapping.
///
/// Ids are assigned densely in insertion order and are never reused or
/// reassigned within one interner's lifetime. The one exception is
/// [`StringInterner::set_index`], an escape hatch for the line codec, which
/// reconstructs an interner from persisted `<id> "<string>"` declarations.
#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    str_to_id: AHashMap<String, StrId>,
    id_to_str: AHashMap<StrId, String>,
    next_id: u32,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its id. Idempotent.
    pub fn intern(&mut self, value: &str) -> StrId {
        if let Some(&id) = self.str_to_id.get(value) {
            return id;
        }

        let id = StrId(self.next_id);
        self.next_id += 1;
        self.str_to_id.insert(value.to_string(), id);
        self.id_to_str.insert(id, value.to_string());
        id
    }

    /// Look up an existing id for a string without inserting.
    pub fn id_of(&self, value: &str) -> Option<StrId> {
        self.str_to_id.get(value).copied()
    }

    /// Look up the string for an id.
    pub fn lookup(&self, id: StrId) -> Option<&str> {
        self.id_to_str.get(&id).map(|s| s.as_str())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.str_to_id.contains_key(value)
    }

    /// Force-associate a value with a specific id.
    ///
    /// Escape hatch for the line codec only: it rebuilds an interner from a
    /// persisted id/value mapping, so ids arrive out of insertion order.
    /// `next_id` is bumped past the forced id so later [`intern`] calls can
    /// never collide with it.
    ///
    /// [`intern`]: StringInterner::intern
    pub fn set_index(&mut self, value: &str, id: StrId) {
        self.str_to_id.insert(value.to_string(), id);
        self.id_to_str.insert(id, value.to_string());
        self.next_id = self.next_id.max(id.raw() + 1);
    }

    /// Number of distinct strings interned.
    pub fn len(&self) -> usize {
        self.str_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.str_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_assigns_dense_ids_in_insertion_order() {
        let mut interner = StringInterner::new();
        assert_eq!(interner.intern("a"), StrId::new(0));
        assert_eq!(interner.intern("b"), StrId::new(1));
        assert_eq!(interner.intern("a"), StrId::new(0));
        assert_eq!(interner.intern("c"), StrId::new(2));
        assert_eq!(interner.len(), 3);
    }

    #[test]
    fn lookup_is_the_inverse_of_intern() {
        let mut interner = StringInterner::new();
        let id = interner.intern("urn:ró:bird:apus-apus");
        assert_eq!(interner.lookup(id), Some("urn:ró:bird:apus-apus"));
        assert_eq!(interner.id_of("urn:ró:bird:apus-apus"), Some(id));
        assert_eq!(interner.id_of("missing"), None);
        assert_eq!(interner.lookup(StrId::new(999)), None);
    }

    #[test]
    fn set_index_keeps_later_interns_collision_free() {
        let mut interner = StringInterner::new();
        interner.set_index("persisted", StrId::new(7));
        let fresh = interner.intern("fresh");
        assert_eq!(interner.lookup(StrId::new(7)), Some("persisted"));
        assert!(fresh.raw() > 7);
    }

    #[test]
    fn clone_mutates_independently() {
        let mut interner = StringInterner::new();
        interner.intern("shared");
        let mut copy = interner.clone();
        copy.intern("only-in-copy");
        assert!(!interner.contains("only-in-copy"));
        assert!(copy.contains("shared"));
    }
}
