//! Loading of schema documents and parameter files.
//!
//! Handles loading JSON from files, strings, and HTTP URLs, and navigating
//! JSON Pointer fragments within a loaded document.

use std::path::Path;

use serde_json::Value;

use crate::error::ResolveError;
use crate::types::{json_type_name, ParameterSet};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `ResolveError::FileNotFound` if the file doesn't exist,
/// or `ResolveError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, ResolveError> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ResolveError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    load_schema_str(&content)
}

/// Load a JSON document from a string.
///
/// # Errors
///
/// Returns `ResolveError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, ResolveError> {
    serde_json::from_str(content).map_err(|source| ResolveError::InvalidJson { source })
}

/// Load a schema document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ResolveError::NetworkError` if the request fails or the body
/// isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Value, ResolveError> {
    let network_error = |source| ResolveError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    tracing::debug!(url, "fetching schema document");
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a schema document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_schema_auto(source: &str) -> Result<Value, ResolveError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ResolveError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

/// Load a parameter set from a JSON file.
///
/// # Errors
///
/// Besides the errors of [`load_schema`], returns
/// `ResolveError::InvalidParams` when the document is not a JSON object.
pub fn load_params(path: &Path) -> Result<ParameterSet, ResolveError> {
    params_from_value(load_schema(path)?)
}

/// Convert a decoded JSON value into a parameter set.
pub fn params_from_value(value: Value) -> Result<ParameterSet, ResolveError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ResolveError::InvalidParams {
            message: format!("expected an object, got {}", json_type_name(&other)),
        }),
    }
}

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/app" or "#/links/0").
///
/// The fragment may start with '#'. A bare "#" or empty fragment yields the
/// document root.
///
/// # Errors
///
/// Returns `ResolveError::ReferenceNotFound` when any segment is missing.
pub fn navigate_fragment<'a>(document: &'a Value, fragment: &str) -> Result<&'a Value, ResolveError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(document);
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| ResolveError::ReferenceNotFound {
            reference: fragment.to_string(),
        })?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_schema_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "object"}}"#).unwrap();

        let schema = load_schema(file.path()).unwrap();
        assert_eq!(schema["type"], "object");
    }

    #[test]
    fn load_schema_file_not_found() {
        let result = load_schema(Path::new("/nonexistent/path.json"));
        assert!(matches!(result, Err(ResolveError::FileNotFound { .. })));
    }

    #[test]
    fn load_schema_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let result = load_schema(file.path());
        assert!(matches!(result, Err(ResolveError::InvalidJson { .. })));
    }

    #[test]
    fn load_schema_str_invalid() {
        let result = load_schema_str("not json");
        assert!(matches!(result, Err(ResolveError::InvalidJson { .. })));
    }

    #[test]
    fn is_url_detection() {
        assert!(is_url("https://example.com/schema.json"));
        assert!(is_url("http://example.com/schema.json"));
        assert!(!is_url("/path/to/schema.json"));
        assert!(!is_url("schema.json"));
    }

    #[test]
    fn load_params_object() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name": "app1", "count": 2}}"#).unwrap();

        let params = load_params(file.path()).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["name"], "app1");
    }

    #[test]
    fn load_params_rejects_non_object() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"["name"]"#).unwrap();

        let result = load_params(file.path());
        match result {
            Err(ResolveError::InvalidParams { message }) => {
                assert_eq!(message, "expected an object, got array");
            }
            other => panic!("expected InvalidParams, got {other:?}"),
        }
    }

    #[test]
    fn navigate_nested_definitions() {
        let doc = json!({
            "definitions": {
                "app": {
                    "definitions": { "name": { "type": ["string"] } }
                }
            }
        });
        let node = navigate_fragment(&doc, "#/definitions/app/definitions/name").unwrap();
        assert_eq!(node["type"], json!(["string"]));
    }

    #[test]
    fn navigate_array_index() {
        let doc = json!({ "links": [{ "href": "/apps" }, { "href": "/apps/{id}" }] });
        let node = navigate_fragment(&doc, "#/links/1").unwrap();
        assert_eq!(node["href"], "/apps/{id}");
    }

    #[test]
    fn navigate_root() {
        let doc = json!({ "type": "object" });
        assert_eq!(navigate_fragment(&doc, "#").unwrap(), &doc);
        assert_eq!(navigate_fragment(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn navigate_escaped_segment() {
        let doc = json!({ "paths": { "/apps": { "get": {} }, "a~b": 1 } });
        assert!(navigate_fragment(&doc, "#/paths/~1apps/get").is_ok());
        assert_eq!(navigate_fragment(&doc, "#/paths/a~0b").unwrap(), &json!(1));
    }

    #[test]
    fn navigate_missing_segment() {
        let doc = json!({ "definitions": {} });
        let result = navigate_fragment(&doc, "#/definitions/missing");
        match result {
            Err(ResolveError::ReferenceNotFound { reference }) => {
                assert_eq!(reference, "#/definitions/missing");
            }
            other => panic!("expected ReferenceNotFound, got {other:?}"),
        }
    }
}
