//! Required and undeclared parameter detection.
//!
//! Keys are compared by exact equality. Results keep the order of the
//! sequence being filtered: `required` for missing keys, the parameter set
//! for extra keys.

use crate::schema::LinkSchema;
use crate::types::ParameterSet;

/// Required parameters that were not supplied.
pub fn missing_keys(params: &ParameterSet, link: &LinkSchema) -> Vec<String> {
    link.required
        .iter()
        .filter(|name| !params.contains_key(name.as_str()))
        .cloned()
        .collect()
}

/// Supplied parameters that the link schema does not declare.
pub fn extra_keys(params: &ParameterSet, link: &LinkSchema) -> Vec<String> {
    params
        .keys()
        .filter(|name| !link.declared_names().any(|declared| declared == name.as_str()))
        .cloned()
        .collect()
}
