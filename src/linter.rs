//! Schema linting - static consistency checks of schema documents.
//!
//! Finds problems that would otherwise surface as `ResolveError`s in the
//! middle of validating a request:
//! - JSON syntax errors
//! - internal `$ref` pointers that resolve to nothing
//! - `anyOf` combinators that are malformed or nested beyond one level
//! - `pattern` values that do not compile
//! - array parameters in link schemas without `items`

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::loader::{load_schema, navigate_fragment};
use crate::schema::PropertySchema;
use crate::types::json_type_name;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub file: PathBuf,
    /// JSON path to the issue (e.g., "/definitions/app/anyOf")
    pub path: String,
    pub message: String,
}

/// Result of linting a single file.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Status of a linted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Ok,
    Error,
    Warning,
}

/// Result of linting a directory or set of files.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub path: PathBuf,
    pub files_checked: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub results: Vec<FileResult>,
}

impl LintResult {
    /// Returns true if all files passed (no errors).
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Lint a file or directory.
///
/// If path is a directory, recursively finds all .json files.
/// If `strict` is true, files with warnings count as failed.
pub fn lint(path: &Path, strict: bool) -> LintResult {
    let files = collect_schema_files(path);
    let results: Vec<FileResult> = files.iter().map(|file| lint_file(file, path)).collect();

    let count = |severity: Severity| {
        results
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| d.severity == severity)
            .count()
    };
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    let failed = results
        .iter()
        .filter(|r| {
            if strict {
                r.status != FileStatus::Ok
            } else {
                r.status == FileStatus::Error
            }
        })
        .count();

    LintResult {
        path: path.to_path_buf(),
        files_checked: files.len(),
        passed: files.len() - failed,
        failed,
        errors,
        warnings,
        results,
    }
}

/// Lint a single schema document.
pub fn lint_file(file: &Path, base_path: &Path) -> FileResult {
    let relative = file.strip_prefix(base_path).unwrap_or(file).to_path_buf();
    let mut diagnostics = Vec::new();

    match load_schema(file) {
        Ok(schema) => {
            let mut linter = Linter {
                file,
                root: &schema,
                diagnostics: &mut diagnostics,
            };
            linter.walk(&schema, "");
        }
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            code: "E001".to_string(),
            file: file.to_path_buf(),
            path: "/".to_string(),
            message: format!("syntax error: {}", e),
        }),
    }

    let status = if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        FileStatus::Error
    } else if diagnostics.is_empty() {
        FileStatus::Ok
    } else {
        FileStatus::Warning
    };

    FileResult {
        file: relative,
        status,
        diagnostics,
    }
}

struct Linter<'a> {
    file: &'a Path,
    root: &'a Value,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Linter<'_> {
    fn walk(&mut self, value: &Value, path: &str) {
        match value {
            Value::Object(map) => {
                self.check_node(map, path);
                for (key, child) in map {
                    self.walk(child, &format!("{}/{}", path, escape(key)));
                }
            }
            Value::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    self.walk(item, &format!("{}/{}", path, i));
                }
            }
            _ => {}
        }
    }

    fn check_node(&mut self, map: &Map<String, Value>, path: &str) {
        if let Some(Value::String(reference)) = map.get("$ref") {
            // External references are never followed by the validator.
            if reference.starts_with('#') && navigate_fragment(self.root, reference).is_err() {
                self.push(
                    Severity::Error,
                    "E003",
                    format!("{}/$ref", path),
                    format!("reference not found: {}", reference),
                );
            }
        }

        if let Some(Value::String(pattern)) = map.get("pattern") {
            if let Err(e) = Regex::new(pattern) {
                self.push(
                    Severity::Error,
                    "E006",
                    format!("{}/pattern", path),
                    format!("invalid pattern \"{}\": {}", pattern, e),
                );
            }
        }

        if let Some(any_of) = map.get("anyOf") {
            self.check_any_of(any_of, &format!("{}/anyOf", path));
        }

        if let Some(Value::Object(schema)) = map.get("schema") {
            if map.contains_key("href") {
                self.check_link_schema(schema, &format!("{}/schema", path));
            }
        }
    }

    fn check_any_of(&mut self, any_of: &Value, path: &str) {
        let members = match any_of {
            Value::Array(members) if !members.is_empty() => members,
            Value::Array(_) => {
                self.push(
                    Severity::Error,
                    "E007",
                    path.to_string(),
                    "anyOf must not be empty".to_string(),
                );
                return;
            }
            other => {
                self.push(
                    Severity::Error,
                    "E007",
                    path.to_string(),
                    format!("anyOf must be an array, got {}", json_type_name(other)),
                );
                return;
            }
        };

        for (i, member) in members.iter().enumerate() {
            let target = match member.get("$ref").and_then(Value::as_str) {
                Some(reference) => navigate_fragment(self.root, reference).ok(),
                None => Some(member),
            };
            if target.is_some_and(|node| node.get("anyOf").is_some()) {
                self.push(
                    Severity::Warning,
                    "W004",
                    format!("{}/{}", path, i),
                    "nested anyOf is not expanded; only the first level is matched".to_string(),
                );
            }
        }
    }

    fn check_link_schema(&mut self, schema: &Map<String, Value>, path: &str) {
        let Some(Value::Object(properties)) = schema.get("properties") else {
            return;
        };

        for (name, property) in properties {
            if PropertySchema::from_value(property) == PropertySchema::Array(None) {
                self.push(
                    Severity::Error,
                    "E008",
                    format!("{}/properties/{}", path, escape(name)),
                    format!("array parameter \"{}\" has no items", name),
                );
            }
        }
    }

    fn push(&mut self, severity: Severity, code: &str, path: String, message: String) {
        self.diagnostics.push(Diagnostic {
            severity,
            code: code.to_string(),
            file: self.file.to_path_buf(),
            path,
            message,
        });
    }
}

/// Escape a key for use in a JSON Pointer path.
fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Collect all .json files in a path (file or directory).
fn collect_schema_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            return vec![path.to_path_buf()];
        }
        return vec![];
    }

    let mut files = Vec::new();
    collect_files_recursive(path, &mut files);
    files.sort();
    files
}

fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files_recursive(&path, files);
        } else if path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path);
        }
    }
}
