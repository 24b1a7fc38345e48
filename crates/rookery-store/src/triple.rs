//! The triple data model and its flat record view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single `(source, relation, target)` statement.
///
/// Source and target are opaque strings, conventionally URN-shaped; relation
/// is a plain label. Identity is content, not allocation: two triples with
/// equal strings are the same triple. Serializes as a 3-element array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct Triple {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl Triple {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }
}

impl From<(String, String, String)> for Triple {
    fn from((source, relation, target): (String, String, String)) -> Self {
        Self {
            source,
            relation,
            target,
        }
    }
}

impl From<Triple> for (String, String, String) {
    fn from(triple: Triple) -> Self {
        (triple.source, triple.relation, triple.target)
    }
}

impl From<(&str, &str, &str)> for Triple {
    fn from((source, relation, target): (&str, &str, &str)) -> Self {
        Triple::new(source, relation, target)
    }
}

/// The value a relation takes within a [`TripleObject`]: a single distinct
/// target, or several in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// The target values in first-seen order.
    pub fn values(&self) -> &[String] {
        match self {
            FieldValue::One(value) => std::slice::from_ref(value),
            FieldValue::Many(values) => values,
        }
    }

    /// Fold another observed target in, deduplicating and promoting a scalar
    /// to a list on the second distinct value.
    fn push(&mut self, target: &str) {
        match self {
            FieldValue::One(existing) => {
                if existing != target {
                    let first = std::mem::take(existing);
                    *self = FieldValue::Many(vec![first, target.to_string()]);
                }
            }
            FieldValue::Many(values) => {
                if !values.iter().any(|value| value == target) {
                    values.push(target.to_string());
                }
            }
        }
    }
}

/// A record view grouping every triple that shares a source.
///
/// A relation observed with exactly one distinct target maps to a scalar;
/// otherwise to a deduplicated list preserving first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleObject {
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl TripleObject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Record one observed `(relation, target)` pair.
    pub fn push(&mut self, relation: &str, target: &str) {
        match self.fields.get_mut(relation) {
            Some(value) => value.push(target),
            None => {
                self.fields
                    .insert(relation.to_string(), FieldValue::One(target.to_string()));
            }
        }
    }

    /// Value of one relation, if observed.
    pub fn get(&self, relation: &str) -> Option<&FieldValue> {
        self.fields.get(relation)
    }

    /// Flatten back into triples, one per target value.
    pub fn triples(&self) -> Vec<Triple> {
        let mut out = Vec::new();
        for (relation, value) in &self.fields {
            for target in value.values() {
                out.push(Triple::new(&self.id, relation, target));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triples_serialize_as_arrays() {
        let triple = Triple::new("a", "r", "b");
        assert_eq!(
            serde_json::to_string(&triple).unwrap(),
            r#"["a","r","b"]"#
        );
        let back: Triple = serde_json::from_str(r#"["a","r","b"]"#).unwrap();
        assert_eq!(back, triple);
    }

    #[test]
    fn repeated_targets_deduplicate_and_promote_to_lists() {
        let mut obj = TripleObject::new("urn:ró:bird:corvus");
        obj.push("name", "Rook");
        obj.push("name", "Rook");
        assert_eq!(obj.get("name"), Some(&FieldValue::One("Rook".into())));

        obj.push("name", "Corvus frugilegus");
        assert_eq!(
            obj.get("name"),
            Some(&FieldValue::Many(vec![
                "Rook".into(),
                "Corvus frugilegus".into()
            ]))
        );

        obj.push("name", "Rook");
        assert_eq!(obj.get("name").unwrap().values().len(), 2);
    }

    #[test]
    fn objects_flatten_back_to_triples() {
        let mut obj = TripleObject::new("a");
        obj.push("r", "b");
        obj.push("s", "c");
        obj.push("s", "d");
        let triples = obj.triples();
        assert_eq!(triples.len(), 3);
        assert!(triples.contains(&Triple::new("a", "s", "d")));
    }
}
