//! Typed schema object model and reference resolution.
//!
//! A [`SchemaDocument`] wraps an already-parsed Hyper-Schema or OpenAPI-like
//! document. Link schemas and definitions are read out of it into typed
//! values; nothing here ever mutates the document.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use serde_json::{json, Value};

use crate::error::ResolveError;
use crate::loader::navigate_fragment;

/// Ordered candidate definitions for a single value.
///
/// The first candidate a value satisfies wins; the first candidate is used
/// for the error message when none do.
pub type CandidateList = Vec<Definition>;

/// A parsed schema document, read-only for its whole lifetime.
///
/// Candidate lists are compiled the first time a reference is resolved and
/// shared afterwards, so patterns and formats are built once per reference
/// rather than once per validation.
pub struct SchemaDocument {
    root: Value,
    /// Compiled candidates by `$ref`. Inline targets are not cached.
    compiled: RwLock<HashMap<String, Arc<CandidateList>>>,
}

impl SchemaDocument {
    pub fn new(root: Value) -> Self {
        Self {
            root,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying JSON document.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up the node a reference points at.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::ReferenceNotFound` if the reference does not
    /// name a node in this document.
    pub fn find(&self, reference: &str) -> Result<&Value, ResolveError> {
        navigate_fragment(&self.root, reference)
    }

    /// Resolve a reference into its candidate definitions.
    ///
    /// A node carrying `anyOf` expands to one definition per member, in
    /// member order. Members are resolved one level deep: a member's own
    /// `$ref` is followed, but a member's `anyOf` is not expanded further.
    /// Any other node yields a single-element list.
    ///
    /// Failures are not cached; resolving a broken reference again fails again.
    pub fn resolve(&self, reference: &str) -> Result<Arc<CandidateList>, ResolveError> {
        if let Some(candidates) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
        {
            return Ok(Arc::clone(candidates));
        }

        let node = self.find(reference)?;
        let candidates = Arc::new(self.expand(node, reference)?);
        tracing::debug!(reference, candidates = candidates.len(), "resolved reference");

        let mut compiled = self
            .compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(
            compiled
                .entry(reference.to_string())
                .or_insert(candidates),
        ))
    }

    /// Resolve a property target, following `$ref` or using the inline node.
    pub fn resolve_target(&self, target: &Target) -> Result<Arc<CandidateList>, ResolveError> {
        match target {
            Target::Ref(reference) => self.resolve(reference),
            Target::Inline(node) => self.expand(node, "<inline>").map(Arc::new),
        }
    }

    /// Read the link schema of the link object at `pointer`.
    ///
    /// The link's `schema` member describes its parameters. A link without
    /// one accepts no declared parameters.
    pub fn link_schema(&self, pointer: &str) -> Result<LinkSchema, ResolveError> {
        LinkSchema::from_link(self.find(pointer)?)
    }

    fn expand(&self, node: &Value, origin: &str) -> Result<CandidateList, ResolveError> {
        match node.get("anyOf") {
            None => Ok(vec![Definition::from_value(node)?]),
            Some(Value::Array(members)) if !members.is_empty() => members
                .iter()
                .map(|member| match member.get("$ref").and_then(Value::as_str) {
                    Some(reference) => self.find(reference).and_then(Definition::from_value),
                    None => Definition::from_value(member),
                })
                .collect(),
            Some(_) => Err(ResolveError::InvalidSchema {
                message: format!("anyOf at {} must be a non-empty array", origin),
            }),
        }
    }
}

impl Clone for SchemaDocument {
    fn clone(&self) -> Self {
        Self::new(self.root.clone())
    }
}

impl PartialEq for SchemaDocument {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl fmt::Debug for SchemaDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDocument")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Where a property's definition lives.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A `$ref` into the schema document.
    Ref(String),
    /// The schema node itself, when it carries no `$ref`.
    Inline(Value),
}

impl Target {
    pub fn from_node(node: &Value) -> Self {
        match node.get("$ref").and_then(Value::as_str) {
            Some(reference) => Target::Ref(reference.to_string()),
            None => Target::Inline(node.clone()),
        }
    }
}

/// Schema of a single declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySchema {
    /// Any value that is not declared as exactly `["array"]`.
    Scalar(Target),
    /// An array whose items all share the `items` target.
    ///
    /// `None` when the node has no `items`; that is a schema error, raised
    /// only once a value for the property is actually checked.
    Array(Option<Target>),
}

impl PropertySchema {
    /// Classify a property node.
    ///
    /// A property is an array exactly when its declared `type` is the list
    /// `["array"]`. The bare string `"array"` and lists such as
    /// `["array", "null"]` stay scalar and are matched as whole values.
    pub fn from_value(node: &Value) -> Self {
        match node.get("type") {
            Some(Value::Array(types)) if matches!(types.as_slice(), [only] if only == "array") => {
                PropertySchema::Array(node.get("items").map(Target::from_node))
            }
            _ => PropertySchema::Scalar(Target::from_node(node)),
        }
    }
}

/// Parameters accepted by one link: which are required and how each is shaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSchema {
    pub required: Vec<String>,
    /// Declared properties in document order.
    pub properties: Vec<(String, PropertySchema)>,
}

impl LinkSchema {
    /// Build from a link object, reading its `schema` member.
    pub fn from_link(link: &Value) -> Result<Self, ResolveError> {
        match link.get("schema") {
            Some(schema) => Self::from_schema(schema),
            None => Ok(Self::default()),
        }
    }

    /// Build from a schema fragment with `required` and `properties`.
    pub fn from_schema(schema: &Value) -> Result<Self, ResolveError> {
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let properties = match schema.get("properties") {
            None => Vec::new(),
            Some(Value::Object(props)) => props
                .iter()
                .map(|(name, node)| (name.clone(), PropertySchema::from_value(node)))
                .collect(),
            Some(_) => {
                return Err(ResolveError::InvalidSchema {
                    message: "link schema properties must be an object".to_string(),
                })
            }
        };

        Ok(Self {
            required,
            properties,
        })
    }

    /// Names of all declared properties, in document order.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }
}

/// A semantic string format checked through the `jsonschema` format rules.
pub struct Format {
    name: String,
    validator: jsonschema::Validator,
}

impl Format {
    pub fn new(name: &str) -> Result<Self, ResolveError> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&json!({ "format": name }))
            .map_err(|e| ResolveError::InvalidSchema {
                message: format!("format \"{}\": {}", name, e),
            })?;
        Ok(Self {
            name: name.to_string(),
            validator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unknown formats and non-string values always pass.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Format").field(&self.name).finish()
    }
}

/// A resolved schema node: the expected shape of one value.
#[derive(Debug)]
pub struct Definition {
    /// Accepted type names; `None` accepts any type.
    pub types: Option<Vec<String>>,
    pub format: Option<Format>,
    pub pattern: Option<Regex>,
    /// Nested properties, present for one-level object definitions.
    pub properties: Option<Vec<(String, Target)>>,
}

impl Definition {
    /// Read a definition out of a schema node, compiling its pattern and format.
    pub fn from_value(node: &Value) -> Result<Self, ResolveError> {
        let format = node
            .get("format")
            .and_then(Value::as_str)
            .map(Format::new)
            .transpose()?;

        let pattern = node
            .get("pattern")
            .and_then(Value::as_str)
            .map(|p| {
                Regex::new(p).map_err(|source| ResolveError::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .transpose()?;

        let properties = node.get("properties").and_then(Value::as_object).map(|props| {
            props
                .iter()
                .map(|(name, prop)| (name.clone(), Target::from_node(prop)))
                .collect()
        });

        Ok(Self {
            types: parse_types(node)?,
            format,
            pattern,
            properties,
        })
    }
}

/// Read `type` as a list of names; a single string becomes a one-element list.
fn parse_types(node: &Value) -> Result<Option<Vec<String>>, ResolveError> {
    match node.get("type") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
        Some(Value::Array(arr)) => arr
            .iter()
            .map(|v| {
                v.as_str()
                    .map(String::from)
                    .ok_or_else(|| ResolveError::InvalidSchema {
                        message: format!("type entries must be strings, got {}", v),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(other) => Err(ResolveError::InvalidSchema {
            message: format!("type must be a string or array, got {}", other),
        }),
    }
}
