//! URN decomposition.
//!
//! Sources and targets in this library conventionally follow the schema:
//!
//! ```text
//! urn:<namespace>:<kind>:<id>[?<querystring>]
//! ```
//!
//! Information can be contextualised by query-string. E.g. (in triple form)
//!
//! ```text
//! ("urn:ró:bird:apus-apus?photo=123", "in-flight", "true")
//! ```
//!
//! applies only to that photo, while a pattern without query parameters
//!
//! ```text
//! ("urn:ró:bird:apus-apus", "name", "Swift")
//! ```
//!
//! matches every query-string variant of the id. Any string that does not
//! conform to the grammar decomposes to the `unknown` sentinel rather than
//! failing: decomposition is total.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default URN namespace.
pub const DEFAULT_NAMESPACE: &str = "ró";

/// Sentinel kind assigned to strings that are not URNs.
pub const UNKNOWN_KIND: &str = "unknown";

/// Decomposed view of a source/target string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedUrn {
    pub kind: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub qs: HashMap<String, String>,
}

impl ParsedUrn {
    /// The sentinel decomposition for a non-URN value.
    pub fn unknown(value: &str) -> Self {
        Self {
            kind: UNKNOWN_KIND.to_string(),
            id: value.to_string(),
            qs: HashMap::new(),
        }
    }
}

/// Whether a value even looks like a URN (any namespace).
pub fn is_urn(value: &str) -> bool {
    value.starts_with("urn:")
}

/// Decompose a value into `{kind, id, qs}`, accepting any namespace.
///
/// Total: wrong prefix or too few segments yield the `unknown` sentinel with
/// the original value as id.
pub fn decompose(value: &str) -> ParsedUrn {
    let Some(rest) = value.strip_prefix("urn:") else {
        return ParsedUrn::unknown(value);
    };
    let Some((_namespace, rest)) = rest.split_once(':') else {
        return ParsedUrn::unknown(value);
    };
    decompose_segments(value, rest)
}

/// Decompose a value, restricted to one namespace.
///
/// As [`decompose`], but a URN outside `namespace` is also the `unknown`
/// sentinel.
pub fn decompose_in(value: &str, namespace: &str) -> ParsedUrn {
    let remainder = match value
        .strip_prefix("urn:")
        .and_then(|rest| rest.strip_prefix(namespace))
        .and_then(|rest| rest.strip_prefix(':'))
    {
        Some(rest) => rest,
        None => return ParsedUrn::unknown(value),
    };
    decompose_segments(value, remainder)
}

/// `<kind>:<id>[?<querystring>]`
fn decompose_segments(value: &str, remainder: &str) -> ParsedUrn {
    let Some((kind, tail)) = remainder.split_once(':') else {
        return ParsedUrn::unknown(value);
    };

    let (id, qs) = match tail.split_once('?') {
        Some((id, query)) => (id, parse_query(query)),
        None => (tail, HashMap::new()),
    };

    ParsedUrn {
        kind: kind.to_string(),
        id: id.to_string(),
        qs,
    }
}

/// Parse a URL-encoded query string into key/value pairs.
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
