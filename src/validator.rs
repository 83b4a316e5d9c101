//! Parameter validation against link schemas.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolveError, ValidateError};
use crate::keys::{extra_keys, missing_keys};
use crate::matcher::{match_value, Mismatch, MismatchKind};
use crate::schema::{CandidateList, Definition, LinkSchema, PropertySchema, SchemaDocument, Target};
use crate::types::{ParameterSet, ValidateOptions};

/// Everything wrong with one parameter set. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Required parameters that were not supplied, in `required` order.
    pub missing: Vec<String>,
    /// Supplied parameters the link does not declare, in supplied order.
    pub extra: Vec<String>,
    /// One message per value that matched none of its definitions.
    pub other: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.other.is_empty()
    }

    /// Report sections as lines; absent sections are omitted.
    pub fn messages(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.missing.is_empty() {
            lines.push(format!("Require params: {}.", self.missing.join(", ")));
        }
        if !self.extra.is_empty() {
            lines.push(format!("Unknown params: {}.", self.extra.join(", ")));
        }
        lines.extend(self.other.iter().cloned());
        lines
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("\n"))
    }
}

/// Validates parameter sets against links of one schema document.
///
/// Build once and reuse; it holds no per-call state and can be shared
/// between threads. Compiled definitions are cached on the
/// [`SchemaDocument`], so repeated calls only pay for matching.
#[derive(Debug, Clone, Copy)]
pub struct ParamValidator<'a> {
    schema: &'a SchemaDocument,
    options: ValidateOptions,
}

impl<'a> ParamValidator<'a> {
    pub fn new(schema: &'a SchemaDocument, options: ValidateOptions) -> Self {
        Self { schema, options }
    }

    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    /// Validate `params` and return every finding.
    ///
    /// All declared properties that were supplied are checked, even after
    /// earlier mismatches. Declared properties that were not supplied are
    /// skipped; `required` alone decides whether their absence is an error.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` when the schema document is inconsistent, such
    /// as a `$ref` that points nowhere. Such errors are never folded into
    /// the report.
    pub fn validate(
        &self,
        params: &ParameterSet,
        link: &LinkSchema,
    ) -> Result<ValidationReport, ResolveError> {
        let mut report = ValidationReport {
            missing: missing_keys(params, link),
            ..Default::default()
        };

        if !self.options.allow_extra {
            report.extra = extra_keys(params, link);
        }

        for (name, property) in &link.properties {
            let Some(value) = params.get(name) else {
                continue;
            };
            tracing::debug!(property = %name, "checking parameter");

            match property {
                PropertySchema::Scalar(target) => {
                    let candidates = self.schema.resolve_target(target)?;
                    record(&mut report, match_value(name, value, &candidates));
                }
                PropertySchema::Array(Some(items)) => {
                    self.check_array(name, items, value, &mut report)?;
                }
                PropertySchema::Array(None) => {
                    return Err(ResolveError::InvalidSchema {
                        message: format!("array property \"{}\" has no items", name),
                    });
                }
            }
        }

        tracing::debug!(
            missing = report.missing.len(),
            extra = report.extra.len(),
            other = report.other.len(),
            "validation finished"
        );
        Ok(report)
    }

    /// Validate `params`, failing with the whole report when it is not empty.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::InvalidParams` carrying the report, or
    /// `ValidateError::Resolve` for schema errors.
    pub fn check(&self, params: &ParameterSet, link: &LinkSchema) -> Result<(), ValidateError> {
        let report = self.validate(params, link)?;
        if report.is_empty() {
            Ok(())
        } else {
            Err(ValidateError::InvalidParams { report })
        }
    }

    /// Check every element of an array parameter against the `items` shape.
    ///
    /// Only the first item candidate decides whether items are nested
    /// objects. Nested values are checked one level deep. An item missing
    /// a nested key ends checking of the whole property without an error.
    /// Nested targets are resolved the first time an item supplies the key.
    fn check_array(
        &self,
        name: &str,
        items: &Target,
        value: &Value,
        report: &mut ValidationReport,
    ) -> Result<(), ResolveError> {
        let candidates = self.schema.resolve_target(items)?;

        let Value::Array(elements) = value else {
            record(report, Err(type_mismatch(name, value, "array")));
            return Ok(());
        };

        let nested = match candidates.first() {
            Some(Definition {
                properties: Some(nested),
                ..
            }) => nested,
            _ => {
                for element in elements {
                    record(report, match_value(name, element, &candidates));
                }
                return Ok(());
            }
        };

        let mut resolved: HashMap<&str, Arc<CandidateList>> = HashMap::new();

        for element in elements {
            let Value::Object(item) = element else {
                record(report, Err(type_mismatch(name, element, "object")));
                return Ok(());
            };

            for (key, target) in nested {
                let Some(nested_value) = item.get(key.as_str()) else {
                    tracing::debug!(
                        property = %name,
                        key = %key,
                        "array item lacks nested key; skipping rest of property"
                    );
                    return Ok(());
                };
                let nested_candidates = match resolved.entry(key.as_str()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(self.schema.resolve_target(target)?),
                };
                record(report, match_value(key, nested_value, nested_candidates.as_slice()));
            }
        }

        Ok(())
    }
}

fn record(report: &mut ValidationReport, result: Result<(), Mismatch>) {
    if let Err(mismatch) = result {
        report.other.push(mismatch.to_string());
    }
}

fn type_mismatch(name: &str, value: &Value, expected: &str) -> Mismatch {
    Mismatch {
        name: name.to_string(),
        value: value.clone(),
        kind: MismatchKind::Type {
            expected: vec![expected.to_string()],
        },
    }
}

/// Validate `params` against `link` and return the report.
///
/// Shorthand for [`ParamValidator::validate`] on a one-off validator.
pub fn validate(
    params: &ParameterSet,
    schema: &SchemaDocument,
    link: &LinkSchema,
    options: ValidateOptions,
) -> Result<ValidationReport, ResolveError> {
    ParamValidator::new(schema, options).validate(params, link)
}

/// Validate `params` against `link`, failing on any finding.
///
/// Shorthand for [`ParamValidator::check`] on a one-off validator.
pub fn check(
    params: &ParameterSet,
    schema: &SchemaDocument,
    link: &LinkSchema,
    options: ValidateOptions,
) -> Result<(), ValidateError> {
    ParamValidator::new(schema, options).check(params, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ParameterSet {
        value.as_object().cloned().unwrap()
    }

    fn document() -> SchemaDocument {
        SchemaDocument::new(json!({
            "definitions": {
                "name": { "type": ["string"], "pattern": "^[a-z][a-z0-9-]*$" },
                "count": { "type": ["integer"] },
                "line": {
                    "type": ["object"],
                    "properties": {
                        "sku": { "$ref": "#/definitions/name" },
                        "qty": { "$ref": "#/definitions/count" }
                    }
                }
            }
        }))
    }

    fn link() -> LinkSchema {
        LinkSchema::from_schema(&json!({
            "required": ["name"],
            "properties": {
                "name": { "$ref": "#/definitions/name" },
                "count": { "$ref": "#/definitions/count" },
                "labels": { "type": ["array"], "items": { "$ref": "#/definitions/name" } },
                "lines": { "type": ["array"], "items": { "$ref": "#/definitions/line" } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn report_message_sections() {
        let report = ValidationReport {
            missing: vec!["name".into(), "region".into()],
            extra: vec!["bogus".into()],
            other: vec!["first".into(), "second".into()],
        };
        assert_eq!(
            report.to_string(),
            "Require params: name, region.\nUnknown params: bogus.\nfirst\nsecond"
        );
    }

    #[test]
    fn report_message_omits_absent_sections() {
        let report = ValidationReport {
            other: vec!["only".into()],
            ..Default::default()
        };
        assert_eq!(report.to_string(), "only");
        assert_eq!(ValidationReport::default().to_string(), "");
    }

    #[test]
    fn errors_accumulate_across_properties() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(&params(json!({ "name": "Bad Name", "count": "three" })), &link())
            .unwrap();
        assert_eq!(report.other.len(), 2);
        assert!(report.other[0].contains("\"name\""));
        assert!(report.other[1].contains("\"count\""));
    }

    #[test]
    fn array_items_checked_individually() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(
                &params(json!({ "name": "app", "labels": ["ok", "NOT OK", 5] })),
                &link(),
            )
            .unwrap();
        assert_eq!(
            report.other,
            vec![
                r#"Invalid pattern for key "labels": expected "NOT OK" to match "^[a-z][a-z0-9-]*$"."#,
                r#"Invalid type for key "labels": expected 5 to be ["string"]."#,
            ]
        );
    }

    #[test]
    fn non_array_value_for_array_property() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(&params(json!({ "name": "app", "labels": "ok" })), &link())
            .unwrap();
        assert_eq!(
            report.other,
            vec![r#"Invalid type for key "labels": expected "ok" to be ["array"]."#]
        );
    }

    #[test]
    fn nested_missing_key_stops_property_only() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(
                &params(json!({
                    "name": "app",
                    "lines": [
                        { "sku": "widget" },
                        { "sku": "BAD", "qty": 1 }
                    ],
                    "count": "x"
                })),
                &link(),
            )
            .unwrap();
        // The first item lacks qty, so the second item's bad sku goes
        // unchecked. Other properties are still checked.
        assert_eq!(
            report.other,
            vec![r#"Invalid type for key "count": expected "x" to be ["integer"]."#]
        );
    }

    #[test]
    fn nested_errors_before_missing_key_are_kept() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(
                &params(json!({ "name": "app", "lines": [{ "sku": "BAD" }] })),
                &link(),
            )
            .unwrap();
        assert_eq!(report.other.len(), 1);
        assert!(report.other[0].starts_with(r#"Invalid pattern for key "sku""#));
    }

    #[test]
    fn non_object_item_for_nested_array() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(&params(json!({ "name": "app", "lines": ["widget"] })), &link())
            .unwrap();
        assert_eq!(
            report.other,
            vec![r#"Invalid type for key "lines": expected "widget" to be ["object"]."#]
        );
    }

    #[test]
    fn unresolvable_reference_propagates() {
        let doc = SchemaDocument::new(json!({ "definitions": {} }));
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let result = validator.validate(&params(json!({ "name": "app" })), &link());
        assert!(matches!(result, Err(ResolveError::ReferenceNotFound { .. })));
    }

    #[test]
    fn unsupplied_property_is_not_resolved() {
        let doc = SchemaDocument::new(json!({
            "definitions": { "name": { "type": ["string"] } }
        }));
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let report = validator
            .validate(&params(json!({ "name": "app" })), &link())
            .unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn nested_reference_resolved_only_when_supplied() {
        let doc = SchemaDocument::new(json!({
            "definitions": {
                "name": { "type": ["string"] },
                "line": {
                    "type": ["object"],
                    "properties": {
                        "sku": { "$ref": "#/definitions/name" },
                        "qty": { "$ref": "#/definitions/nowhere" }
                    }
                }
            }
        }));
        let validator = ParamValidator::new(&doc, ValidateOptions::new());

        let empty = validator
            .validate(&params(json!({ "name": "app", "lines": [] })), &link())
            .unwrap();
        assert!(empty.is_empty());

        // sku is checked, then the missing qty ends the property before its
        // dangling reference is needed.
        let partial = validator
            .validate(
                &params(json!({ "name": "app", "lines": [{ "sku": "widget" }] })),
                &link(),
            )
            .unwrap();
        assert!(partial.is_empty());

        let supplied = validator.validate(
            &params(json!({ "name": "app", "lines": [{ "sku": "widget", "qty": 1 }] })),
            &link(),
        );
        assert!(matches!(supplied, Err(ResolveError::ReferenceNotFound { .. })));
    }

    #[test]
    fn array_without_items_fails_only_when_supplied() {
        let doc = document();
        let validator = ParamValidator::new(&doc, ValidateOptions::new());
        let link = LinkSchema::from_schema(&json!({
            "properties": {
                "name": { "$ref": "#/definitions/name" },
                "tags": { "type": ["array"] }
            }
        }))
        .unwrap();

        let report = validator
            .validate(&params(json!({ "name": "app" })), &link)
            .unwrap();
        assert!(report.is_empty());

        let result = validator.validate(&params(json!({ "name": "app", "tags": ["a"] })), &link);
        assert!(matches!(result, Err(ResolveError::InvalidSchema { .. })));
    }

    #[test]
    fn check_wraps_report() {
        let doc = document();
        let result = check(
            &params(json!({ "bogus": true })),
            &doc,
            &link(),
            ValidateOptions::new(),
        );
        match result {
            Err(ValidateError::InvalidParams { report }) => {
                assert_eq!(report.missing, vec!["name"]);
                assert_eq!(report.extra, vec!["bogus"]);
            }
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn report_serializes_buckets() {
        let report = ValidationReport {
            missing: vec!["name".into()],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "missing": ["name"], "extra": [], "other": [] })
        );
    }
}
