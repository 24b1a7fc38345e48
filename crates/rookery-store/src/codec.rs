//! The line-oriented triple format.
//!
//! Each distinct string is declared once with a numeric id, then every triple
//! is three ids:
//!
//! ```text
//! 0 "urn:ró:bird:rook"
//! 1 "name"
//! 2 "Rook"
//! 0 1 2
//! ```
//!
//! Declared strings are JSON string literals, so quotes and newlines stay on
//! one line. Decoding rebuilds an interner from the declarations via its
//! forced-id escape hatch and resolves triple lines against it.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::interner::{StrId, StringInterner};
use crate::triple::Triple;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed declaration line: {0}")]
    MalformedDeclaration(String),
    #[error("unrecognised line: {0}")]
    MalformedLine(String),
    #[error("triple line references undeclared id {id}: {line}")]
    UndeclaredId { id: u32, line: String },
}

fn triple_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+) (\d+) (\d+)$").expect("pattern compiles"))
}

fn declaration_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(\d+) "(.*)"$"#).expect("pattern compiles"))
}

/// Streaming encoder; remembers which strings it has already declared.
#[derive(Debug, Default)]
pub struct Encoder {
    strings: StringInterner,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines for one triple: declarations for any string seen for the first
    /// time, then the triple line.
    pub fn encode(&mut self, triple: &Triple) -> String {
        let mut lines = Vec::new();

        for value in [&triple.source, &triple.relation, &triple.target] {
            if self.strings.id_of(value).is_none() {
                let id = self.strings.intern(value);
                lines.push(format!(
                    "{} {}",
                    id.raw(),
                    serde_json::Value::String(value.clone())
                ));
            }
        }

        let source = self.strings.intern(&triple.source);
        let relation = self.strings.intern(&triple.relation);
        let target = self.strings.intern(&triple.target);
        lines.push(format!("{} {} {}", source.raw(), relation.raw(), target.raw()));

        lines.join("\n")
    }

    pub fn encode_all(&mut self, triples: &[Triple]) -> String {
        triples
            .iter()
            .map(|triple| self.encode(triple))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Streaming decoder; accumulates declarations as it goes.
#[derive(Debug, Default)]
pub struct Decoder {
    strings: StringInterner,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// One line: a triple line yields a triple, a declaration line updates
    /// the interner and yields nothing.
    pub fn decode_line(&mut self, line: &str) -> Result<Option<Triple>, CodecError> {
        if let Some(caps) = triple_line().captures(line) {
            let mut values = Vec::with_capacity(3);
            for raw in [&caps[1], &caps[2], &caps[3]] {
                let id: u32 = raw
                    .parse()
                    .map_err(|_| CodecError::MalformedLine(line.to_string()))?;
                let value = self.strings.lookup(StrId::new(id)).ok_or_else(|| {
                    CodecError::UndeclaredId {
                        id,
                        line: line.to_string(),
                    }
                })?;
                values.push(value.to_string());
            }
            let target = values.pop().unwrap_or_default();
            let relation = values.pop().unwrap_or_default();
            let source = values.pop().unwrap_or_default();
            return Ok(Some(Triple::new(source, relation, target)));
        }

        if let Some(caps) = declaration_line().captures(line) {
            let id: u32 = caps[1]
                .parse()
                .map_err(|_| CodecError::MalformedDeclaration(line.to_string()))?;
            let literal = format!("\"{}\"", &caps[2]);
            let value: String = serde_json::from_str(&literal)
                .map_err(|_| CodecError::MalformedDeclaration(line.to_string()))?;
            self.strings.set_index(&value, StrId::new(id));
            return Ok(None);
        }

        Err(CodecError::MalformedLine(line.to_string()))
    }

    /// Decode a whole document, skipping blank lines.
    pub fn decode_all(&mut self, text: &str) -> Result<Vec<Triple>, CodecError> {
        let mut triples = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(triple) = self.decode_line(line)? {
                triples.push(triple);
            }
        }
        Ok(triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples() -> Vec<Triple> {
        vec![
            Triple::new("urn:ró:bird:rook", "name", "Rook"),
            Triple::new("urn:ró:bird:rook", "genus", "Corvus"),
        ]
    }

    #[test]
    fn declarations_appear_once_per_string() {
        let mut encoder = Encoder::new();
        let text = encoder.encode_all(&triples());
        let declarations = text
            .lines()
            .filter(|line| line.contains('"'))
            .count();
        // rook urn, "name", "Rook", "genus", "Corvus"
        assert_eq!(declarations, 5);
        assert!(text.lines().any(|line| line == "0 1 2"));
    }

    #[test]
    fn encoded_text_decodes_back() {
        let mut encoder = Encoder::new();
        let text = encoder.encode_all(&triples());
        let decoded = Decoder::new().decode_all(&text).unwrap();
        assert_eq!(decoded, triples());
    }

    #[test]
    fn escaped_strings_survive_the_round_trip() {
        let awkward = vec![Triple::new(
            "he said \"caw\"",
            "line\nbreak",
            "trailing slash \\",
        )];
        let text = Encoder::new().encode_all(&awkward);
        assert_eq!(text.lines().count(), 4);
        let decoded = Decoder::new().decode_all(&text).unwrap();
        assert_eq!(decoded, awkward);
    }

    #[test]
    fn undeclared_ids_are_an_error() {
        let err = Decoder::new().decode_all("0 \"a\"\n0 0 7").unwrap_err();
        assert!(matches!(err, CodecError::UndeclaredId { id: 7, .. }));
    }

    #[test]
    fn unrecognised_lines_are_an_error() {
        let err = Decoder::new().decode_all("zero one two").unwrap_err();
        assert!(matches!(err, CodecError::MalformedLine(_)));
    }
}
