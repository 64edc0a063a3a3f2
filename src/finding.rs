//! Validation findings.
//!
//! A [`Finding`] is one reported problem or suggestion for a document under
//! validation. Findings accumulate in discovery order inside a
//! [`Validator`](crate::Validator) and are never deduplicated or reordered:
//! the sequence a caller reads back is exactly the sequence libxml2 and the
//! rule engine produced.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of problem a finding reports.
///
/// Schema violations and heuristic suggestions land in the same ordered list,
/// but each entry is tagged so consumers can tell "the document is invalid"
/// apart from "the document is valid but stylistically odd".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    /// The input was not well-formed XML.
    ParseError,
    /// The document disagrees with the dialect's XSD.
    SchemaViolation,
    /// A heuristic content check fired; the document may still be
    /// schema-valid.
    Suggestion,
}

impl FindingKind {
    /// True for kinds that indicate the document is actually invalid,
    /// as opposed to merely suspect.
    pub fn is_violation(self) -> bool {
        matches!(self, FindingKind::ParseError | FindingKind::SchemaViolation)
    }
}

/// A single validation message, with the source line where one is known.
///
/// Line numbers are 1-based and come from libxml2's error reports (schema and
/// parse findings) or from the offending node (heuristic findings). libxml2
/// reports line 0 when it has no position information; that is mapped to
/// `None` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// What class of problem this is.
    pub kind: FindingKind,
    /// Human-readable description.
    pub message: String,
    /// 1-based source line, if known.
    pub line: Option<u32>,
}

impl Finding {
    /// Create a parse-failure finding.
    pub fn parse(message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            kind: FindingKind::ParseError,
            message: message.into(),
            line,
        }
    }

    /// Create a schema-violation finding.
    pub fn schema(message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            kind: FindingKind::SchemaViolation,
            message: message.into(),
            line,
        }
    }

    /// Create a heuristic-suggestion finding.
    pub fn suggestion(message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            kind: FindingKind::Suggestion,
            message: message.into(),
            line,
        }
    }

    /// True when this finding makes the document invalid (parse or schema
    /// problem), false for heuristic suggestions.
    pub fn is_violation(&self) -> bool {
        self.kind.is_violation()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_line() {
        let finding = Finding::schema("element 'bogus' is not expected", Some(7));
        assert_eq!(
            finding.to_string(),
            "line 7: element 'bogus' is not expected"
        );
    }

    #[test]
    fn test_display_without_line() {
        let finding = Finding::parse("input is not well-formed XML", None);
        assert_eq!(finding.to_string(), "input is not well-formed XML");
    }

    #[test]
    fn test_violation_predicate() {
        assert!(Finding::parse("x", None).is_violation());
        assert!(Finding::schema("x", None).is_violation());
        assert!(!Finding::suggestion("x", None).is_violation());
    }

    #[test]
    fn test_serialization_shape() {
        let finding = Finding::suggestion("consider \"Castleman, Mike\"", Some(12));
        let json = serde_json::to_value(&finding).expect("finding serializes");
        assert_eq!(json["kind"], "Suggestion");
        assert_eq!(json["line"], 12);
    }
}
