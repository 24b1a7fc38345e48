//! Combinators for building query predicates.

use std::sync::Arc;

use crate::query::NodePredicate;
use crate::urn::DEFAULT_NAMESPACE;

/// Matches everything.
pub fn truth() -> NodePredicate {
    Arc::new(|_| true)
}

/// Matches nothing.
pub fn falsity() -> NodePredicate {
    Arc::new(|_| false)
}

/// Every predicate must hold.
pub fn all(predicates: Vec<NodePredicate>) -> NodePredicate {
    Arc::new(move |value| predicates.iter().all(|predicate| predicate(value)))
}

/// At least one predicate must hold.
pub fn any(predicates: Vec<NodePredicate>) -> NodePredicate {
    Arc::new(move |value| predicates.iter().any(|predicate| predicate(value)))
}

pub fn not(predicate: NodePredicate) -> NodePredicate {
    Arc::new(move |value| !predicate(value))
}

/// Matches URNs in the given namespace.
pub fn is_urn(namespace: &str) -> NodePredicate {
    let prefix = format!("urn:{namespace}:");
    Arc::new(move |value| value.starts_with(&prefix))
}

/// Matches URNs in the default namespace.
pub fn is_default_urn() -> NodePredicate {
    is_urn(DEFAULT_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinators_compose() {
        let vowel_start = || -> NodePredicate {
            Arc::new(|value: &str| value.starts_with(['a', 'e', 'i', 'o', 'u']))
        };
        let long = || -> NodePredicate { Arc::new(|value: &str| value.len() > 3) };

        assert!(all(vec![vowel_start(), long()])("otter"));
        assert!(!all(vec![vowel_start(), long()])("owl"));
        assert!(any(vec![vowel_start(), falsity()])("owl"));
        assert!(!not(truth())("anything"));
    }

    #[test]
    fn is_urn_checks_the_namespace() {
        assert!(is_default_urn()("urn:ró:bird:rook"));
        assert!(!is_default_urn()("urn:geo:city:cork"));
        assert!(is_urn("geo")("urn:geo:city:cork"));
    }
}
