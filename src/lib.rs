//! Parameter Validator
//!
//! Schema-driven validation of decoded API request and response parameters.
//!
//! Given a parameter set, a schema document and the link schema of one
//! operation, the validator reports every structural problem at once:
//! missing required parameters, undeclared parameters, and values that match
//! none of their candidate definitions.
//!
//! # Example
//!
//! ```
//! use param_validator::{validate, LinkSchema, SchemaDocument, ValidateOptions};
//! use serde_json::json;
//!
//! let schema = SchemaDocument::new(json!({
//!     "definitions": {
//!         "app": {
//!             "definitions": {
//!                 "id": { "type": ["string"], "format": "uuid" },
//!                 "name": { "type": ["string"], "pattern": "^[a-z][a-z0-9-]{2,29}$" }
//!             },
//!             "links": [{
//!                 "href": "/apps",
//!                 "method": "POST",
//!                 "schema": {
//!                     "required": ["name"],
//!                     "properties": {
//!                         "name": { "$ref": "#/definitions/app/definitions/name" }
//!                     }
//!                 }
//!             }]
//!         }
//!     }
//! }));
//!
//! let link = schema.link_schema("#/definitions/app/links/0").unwrap();
//! let params = json!({ "name": "My App", "region": "eu" });
//!
//! let report = validate(
//!     params.as_object().unwrap(),
//!     &schema,
//!     &link,
//!     ValidateOptions::new(),
//! )
//! .unwrap();
//!
//! assert_eq!(report.extra, vec!["region"]);
//! assert_eq!(report.other.len(), 1);
//! assert!(report.other[0].starts_with("Invalid pattern for key \"name\""));
//! ```
//!
//! # Matching Rules
//!
//! | Check | Passes when |
//! |-------|-------------|
//! | `type` | absent, or the value's type is listed (integers also count as `number`) |
//! | `format` | absent, unknown, or the value satisfies the format |
//! | `pattern` | absent, or the regular expression matches somewhere in the value |
//!
//! A reference whose node has `anyOf` yields one candidate per member. The
//! first candidate passing all three checks wins; when none does, the error
//! is phrased against the first candidate.
//!
//! Array parameters are checked item by item, one level deep. When the item
//! definition declares `properties`, each item's nested values are checked;
//! an item missing one of those keys ends checking of that parameter
//! without an error.

mod error;
mod keys;
mod linter;
mod loader;
mod matcher;
mod schema;
mod types;
mod validator;

pub use error::{ResolveError, ValidateError};
pub use keys::{extra_keys, missing_keys};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{
    is_url, load_params, load_schema, load_schema_auto, load_schema_str, navigate_fragment,
    params_from_value,
};
pub use matcher::{match_value, Mismatch, MismatchKind};
pub use schema::{
    CandidateList, Definition, Format, LinkSchema, PropertySchema, SchemaDocument, Target,
};
pub use types::{json_type_name, value_type_names, ParameterSet, ValidateOptions};
pub use validator::{check, validate, ParamValidator, ValidationReport};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
