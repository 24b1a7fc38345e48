//! Query inputs and their normalization.
//!
//! Callers hand the store loosely shaped queries: bare strings, lists of
//! strings, constraint objects, or lists of those, in either a named
//! `{source, relation, target}` form or a positional 3-element form. All of
//! that collapses to one canonical shape here, exactly once, at the boundary;
//! the search engine only ever sees [`NormalizedQuery`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::urn;

/// A filter over a source, target, or relation string.
pub type NodePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// One value or several; several means ANY-of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn as_slice(&self) -> &[String] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        OneOrMany::Many(values)
    }
}

/// Constraint on one node field (source or target).
///
/// Only the sub-constraints actually present narrow the result: `kind` is an
/// exact match, `id` matches any listed id, `qs` requires every listed pair
/// simultaneously, and the predicate filters whatever the others left. A
/// default constraint matches everything.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub qs: HashMap<String, String>,
    #[serde(skip)]
    pub predicate: Option<NodePredicate>,
}

impl NodeConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The constraint a bare query string stands for: URNs decompose into
    /// their kind/id/qs, anything else is the `unknown` sentinel with the
    /// string as id.
    pub fn from_value(value: &str) -> Self {
        let parsed = urn::decompose(value);
        Self {
            kind: Some(parsed.kind),
            id: Some(OneOrMany::One(parsed.id)),
            qs: parsed.qs,
            predicate: None,
        }
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn id(mut self, id: impl Into<OneOrMany>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn qs(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qs.insert(key.into(), value.into());
        self
    }

    pub fn predicate(mut self, predicate: NodePredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl fmt::Debug for NodeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConstraint")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("qs", &self.qs)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Source/target position of a query, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeSearch {
    Value(String),
    Values(Vec<String>),
    One(NodeConstraint),
    Many(Vec<NodeConstraint>),
}

impl NodeSearch {
    /// Collapse to the alternatives list the engine unions over.
    pub(crate) fn normalize(&self) -> Vec<NodeConstraint> {
        match self {
            NodeSearch::Value(value) => vec![NodeConstraint::from_value(value)],
            NodeSearch::Values(values) => {
                values.iter().map(|v| NodeConstraint::from_value(v)).collect()
            }
            NodeSearch::One(constraint) => vec![constraint.clone()],
            NodeSearch::Many(constraints) => constraints.clone(),
        }
    }
}

impl From<&str> for NodeSearch {
    fn from(value: &str) -> Self {
        NodeSearch::Value(value.to_string())
    }
}

impl From<String> for NodeSearch {
    fn from(value: String) -> Self {
        NodeSearch::Value(value)
    }
}

impl From<Vec<String>> for NodeSearch {
    fn from(values: Vec<String>) -> Self {
        NodeSearch::Values(values)
    }
}

impl From<NodeConstraint> for NodeSearch {
    fn from(constraint: NodeConstraint) -> Self {
        NodeSearch::One(constraint)
    }
}

impl From<Vec<NodeConstraint>> for NodeSearch {
    fn from(constraints: Vec<NodeConstraint>) -> Self {
        NodeSearch::Many(constraints)
    }
}

/// Constraint on the relation label: any listed name, optionally filtered.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationConstraint {
    pub relation: OneOrMany,
    #[serde(skip)]
    pub predicate: Option<NodePredicate>,
}

impl RelationConstraint {
    pub fn new(relation: impl Into<OneOrMany>) -> Self {
        Self {
            relation: relation.into(),
            predicate: None,
        }
    }

    pub fn predicate(mut self, predicate: NodePredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

impl fmt::Debug for RelationConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationConstraint")
            .field("relation", &self.relation)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Relation position of a query, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelationSearch {
    Name(String),
    Names(Vec<String>),
    Constraint(RelationConstraint),
}

impl RelationSearch {
    pub(crate) fn normalize(&self) -> RelationConstraint {
        match self {
            RelationSearch::Name(name) => RelationConstraint::new(name.as_str()),
            RelationSearch::Names(names) => RelationConstraint::new(names.clone()),
            RelationSearch::Constraint(constraint) => constraint.clone(),
        }
    }
}

impl From<&str> for RelationSearch {
    fn from(name: &str) -> Self {
        RelationSearch::Name(name.to_string())
    }
}

impl From<Vec<String>> for RelationSearch {
    fn from(names: Vec<String>) -> Self {
        RelationSearch::Names(names)
    }
}

impl From<RelationConstraint> for RelationSearch {
    fn from(constraint: RelationConstraint) -> Self {
        RelationSearch::Constraint(constraint)
    }
}

/// A search over the store. Absent fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub source: Option<NodeSearch>,
    pub relation: Option<RelationSearch>,
    pub target: Option<NodeSearch>,
}

impl Query {
    /// The match-everything query.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, search: impl Into<NodeSearch>) -> Self {
        self.source = Some(search.into());
        self
    }

    pub fn relation(mut self, search: impl Into<RelationSearch>) -> Self {
        self.relation = Some(search.into());
        self
    }

    pub fn target(mut self, search: impl Into<NodeSearch>) -> Self {
        self.target = Some(search.into());
        self
    }

    pub(crate) fn normalize(&self) -> NormalizedQuery {
        NormalizedQuery {
            source: self.source.as_ref().map(NodeSearch::normalize),
            relation: self.relation.as_ref().map(RelationSearch::normalize),
            target: self.target.as_ref().map(NodeSearch::normalize),
        }
    }
}

/// The canonical shape the search engine evaluates.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedQuery {
    pub source: Option<Vec<NodeConstraint>>,
    pub relation: Option<RelationConstraint>,
    pub target: Option<Vec<NodeConstraint>>,
}

// Accepts the named `{source, relation, target}` object form and the
// positional `[source, relation, target]` array form. Unknown keys are
// rejected here, before any index access.
impl<'de> Deserialize<'de> for Query {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct QueryVisitor;

        impl<'de> Visitor<'de> for QueryVisitor {
            type Value = Query;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(
                    "a {source, relation, target} object or a [source, relation, target] array",
                )
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Query, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let source = seq.next_element::<Option<NodeSearch>>()?.flatten();
                let relation = seq.next_element::<Option<RelationSearch>>()?.flatten();
                let target = seq.next_element::<Option<NodeSearch>>()?.flatten();
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(
                        4,
                        &"at most three positional query fields",
                    ));
                }
                Ok(Query {
                    source,
                    relation,
                    target,
                })
            }

            fn visit_map<A>(self, mut map: A) -> Result<Query, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut query = Query::new();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "source" => query.source = map.next_value()?,
                        "relation" => query.relation = map.next_value()?,
                        "target" => query.target = map.next_value()?,
                        other => {
                            return Err(de::Error::unknown_field(
                                other,
                                &["source", "relation", "target"],
                            ))
                        }
                    }
                }
                Ok(query)
            }
        }

        deserializer.deserialize_any(QueryVisitor)
    }
}
