//! Matching a single value against candidate definitions.
//!
//! Candidates are tried in order and the first one whose type, format and
//! pattern checks all pass is accepted. When none pass, the mismatch is
//! reported against the first candidate only.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::schema::Definition;
use crate::types::value_type_names;

/// Which check rejected a value, with the constraint it was held to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchKind {
    Type { expected: Vec<String> },
    Format { format: String },
    Pattern { pattern: String },
}

/// A value that satisfied none of its candidate definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Parameter (or nested key) name.
    pub name: String,
    pub value: Value,
    /// The failing check of the first candidate.
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::Type { expected } => write!(
                f,
                "Invalid type for key \"{}\": expected {} to be {}.",
                self.name,
                self.value,
                Value::from(expected.clone())
            ),
            MismatchKind::Format { format } => write!(
                f,
                "Invalid format for key \"{}\": expected \"{}\" to be \"{}\".",
                self.name,
                subject(&self.value),
                format
            ),
            MismatchKind::Pattern { pattern } => write!(
                f,
                "Invalid pattern for key \"{}\": expected {} to match \"{}\".",
                self.name, self.value, pattern
            ),
        }
    }
}

/// Match `value` against `candidates`, first match wins.
///
/// Resolution never produces an empty candidate list; an empty slice
/// constrains nothing and matches.
pub fn match_value(name: &str, value: &Value, candidates: &[Definition]) -> Result<(), Mismatch> {
    for (index, candidate) in candidates.iter().enumerate() {
        if first_failure(candidate, value).is_none() {
            tracing::trace!(name, index, "value matched candidate");
            return Ok(());
        }
    }

    match candidates.first().and_then(|primary| first_failure(primary, value)) {
        Some(kind) => Err(Mismatch {
            name: name.to_string(),
            value: value.clone(),
            kind,
        }),
        None => Ok(()),
    }
}

/// The first check (type, then format, then pattern) a definition rejects.
fn first_failure(definition: &Definition, value: &Value) -> Option<MismatchKind> {
    if let Some(types) = &definition.types {
        let actual = value_type_names(value);
        if !types.iter().any(|t| actual.contains(&t.as_str())) {
            return Some(MismatchKind::Type {
                expected: types.clone(),
            });
        }
    }

    if let Some(format) = &definition.format {
        if !format.is_valid(value) {
            return Some(MismatchKind::Format {
                format: format.name().to_string(),
            });
        }
    }

    if let Some(pattern) = &definition.pattern {
        if !pattern.is_match(&subject(value)) {
            return Some(MismatchKind::Pattern {
                pattern: pattern.as_str().to_string(),
            });
        }
    }

    None
}

/// Strings match as-is; anything else matches as its JSON text.
fn subject(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
