//! Core types shared by the resolver, matcher and validator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded request or response parameters, keyed by parameter name.
pub type ParameterSet = Map<String, Value>;

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns every schema type name a value satisfies.
///
/// Integers satisfy both `integer` and `number`.
pub fn value_type_names(value: &Value) -> &'static [&'static str] {
    match value {
        Value::Null => &["null"],
        Value::Bool(_) => &["boolean"],
        Value::Number(n) if n.is_i64() || n.is_u64() => &["integer", "number"],
        Value::Number(_) => &["number"],
        Value::String(_) => &["string"],
        Value::Array(_) => &["array"],
        Value::Object(_) => &["object"],
    }
}

/// Options for parameter validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// When true, parameters not declared in the link schema are accepted
    /// and extra-key detection is skipped entirely.
    #[serde(default)]
    pub allow_extra: bool,
}

impl ValidateOptions {
    /// Create options that reject undeclared parameters (default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether undeclared parameters are allowed.
    pub fn allow_extra(mut self, allow_extra: bool) -> Self {
        self.allow_extra = allow_extra;
        self
    }
}
