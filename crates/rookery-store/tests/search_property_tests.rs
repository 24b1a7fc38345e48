//! Property tests comparing the indexed search engine against a naive scan
//! over the decomposed triples.

use proptest::prelude::*;
use rookery_store::{decompose, NodeConstraint, OneOrMany, Query, Triple, TripleStore};

fn kind() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["bird", "cat", "place"]).prop_map(str::to_string)
}

fn id() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
}

fn relation() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["name", "sees", "near"]).prop_map(str::to_string)
}

fn qs_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["photo", "era"]).prop_map(str::to_string)
}

fn qs_value() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["1", "2"]).prop_map(str::to_string)
}

/// URNs with and without query strings, plus bare literals.
fn node_value() -> impl Strategy<Value = String> {
    prop_oneof![
        (kind(), id()).prop_map(|(kind, id)| format!("urn:ró:{kind}:{id}")),
        (kind(), id(), qs_key(), qs_value())
            .prop_map(|(kind, id, key, value)| format!("urn:ró:{kind}:{id}?{key}={value}")),
        id(),
    ]
}

fn triples_strategy() -> impl Strategy<Value = Vec<Triple>> {
    prop::collection::vec(
        (node_value(), relation(), node_value())
            .prop_map(|(source, relation, target)| Triple::new(source, relation, target)),
        0..40,
    )
}

/// The definition the index must agree with: decompose the field and check
/// each present sub-constraint.
fn node_ok(
    value: &str,
    kind: &Option<String>,
    ids: &Option<Vec<String>>,
    qs: &Option<(String, String)>,
) -> bool {
    let parsed = decompose(value);
    if let Some(kind) = kind {
        if parsed.kind != *kind {
            return false;
        }
    }
    if let Some(ids) = ids {
        if !ids.contains(&parsed.id) {
            return false;
        }
    }
    if let Some((key, value)) = qs {
        if parsed.qs.get(key) != Some(value) {
            return false;
        }
    }
    true
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn indexed_search_matches_naive_scan(
        triples in triples_strategy(),
        kind in prop::option::of(kind()),
        ids in prop::option::of(prop::collection::vec(id(), 1..3)),
        qs in prop::option::of((qs_key(), qs_value())),
        relations in prop::option::of(prop::collection::vec(relation(), 1..3)),
    ) {
        let store = TripleStore::new(&triples);
        let live = store.triples();

        let source_constrained = kind.is_some() || ids.is_some() || qs.is_some();
        let mut query = Query::new();
        if source_constrained {
            let mut constraint = NodeConstraint::new();
            constraint.kind = kind.clone();
            constraint.id = ids.clone().map(OneOrMany::Many);
            if let Some((key, value)) = &qs {
                constraint = constraint.qs(key.clone(), value.clone());
            }
            query = query.source(constraint);
        }
        if let Some(relations) = &relations {
            query = query.relation(relations.clone());
        }

        let mut expected: Vec<Triple> = live
            .iter()
            .filter(|triple| {
                (!source_constrained || node_ok(&triple.source, &kind, &ids, &qs))
                    && relations
                        .as_ref()
                        .map_or(true, |names| names.contains(&triple.relation))
            })
            .cloned()
            .collect();

        let mut actual = store.search(&query).triples();
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn target_constraints_agree_with_the_scan(
        triples in triples_strategy(),
        kind in prop::option::of(kind()),
        ids in prop::option::of(prop::collection::vec(id(), 1..3)),
    ) {
        let store = TripleStore::new(&triples);
        let live = store.triples();

        let mut constraint = NodeConstraint::new();
        constraint.kind = kind.clone();
        constraint.id = ids.clone().map(OneOrMany::Many);
        let query = Query::new().target(constraint);

        let none: Option<(String, String)> = None;
        let mut expected: Vec<Triple> = live
            .iter()
            .filter(|triple| node_ok(&triple.target, &kind, &ids, &none))
            .cloned()
            .collect();

        let mut actual = store.search(&query).triples();
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn duplicate_inserts_collapse(triples in triples_strategy()) {
        let store = TripleStore::new(&triples);
        let mut distinct = triples.clone();
        distinct.sort();
        distinct.dedup();
        prop_assert_eq!(store.len(), distinct.len());
    }

    #[test]
    fn deleted_then_re_added_triples_stay_searchable(
        triples in triples_strategy(),
        selector in prop::collection::vec(any::<bool>(), 40),
    ) {
        let mut store = TripleStore::new(&triples);
        let before = store.triples();

        let victims: Vec<Triple> = before
            .iter()
            .enumerate()
            .filter(|(i, _)| selector[i % selector.len()])
            .map(|(_, triple)| triple.clone())
            .collect();

        store.delete(&victims);
        prop_assert_eq!(store.len(), before.len() - victims.len());
        store.add(&victims).unwrap();

        let mut after = store.triples();
        let mut expected = before;
        after.sort();
        expected.sort();
        prop_assert_eq!(expected, after);
    }
}
