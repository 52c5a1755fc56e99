//! Loading replacement sources
//!
//! Sources are flat key-value mappings taken from JSON or TOML files (often
//! a nested object of a project metadata file), from `KEY=VALUE` assignments
//! or from environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::template::Mapping;

/// Errors that can occur when loading a replacement source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unsupported source format for {} (expected .json or .toml)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("'{select}' not found in {}", path.display())]
    SelectionNotFound { path: PathBuf, select: String },

    #[error("'{select}' in {} is not a table of values", path.display())]
    NotATable { path: PathBuf, select: String },

    #[error("invalid assignment '{0}', expected KEY=VALUE")]
    InvalidAssignment(String),
}

/// Split a `FILE#SELECT` argument into its path and optional selection
pub fn split_selector(arg: &str) -> (PathBuf, Option<String>) {
    match arg.split_once('#') {
        Some((path, select)) if !select.is_empty() => {
            (PathBuf::from(path), Some(select.to_string()))
        }
        Some((path, _)) => (PathBuf::from(path), None),
        None => (PathBuf::from(arg), None),
    }
}

/// Load a mapping from a `.json` or `.toml` file
///
/// `select` picks a nested table (a JSON pointer such as `/package` for JSON,
/// a dotted path such as `package.meta` for TOML). `keys`, when given, keeps
/// only the named entries.
pub fn load_file(
    path: &Path,
    select: Option<&str>,
    keys: Option<&[String]>,
) -> Result<Mapping, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mapping = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => json_mapping(path, &content, select)?,
        Some("toml") => toml_mapping(path, &content, select)?,
        _ => {
            return Err(SourceError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    Ok(match keys {
        Some(keys) => retain_keys(mapping, keys),
        None => mapping,
    })
}

fn json_mapping(path: &Path, content: &str, select: Option<&str>) -> Result<Mapping, SourceError> {
    let root: serde_json::Value =
        serde_json::from_str(content).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let selected = match select {
        Some(pointer) => root
            .pointer(pointer)
            .ok_or_else(|| SourceError::SelectionNotFound {
                path: path.to_path_buf(),
                select: pointer.to_string(),
            })?,
        None => &root,
    };

    let object = selected.as_object().ok_or_else(|| SourceError::NotATable {
        path: path.to_path_buf(),
        select: select.unwrap_or("/").to_string(),
    })?;

    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), json_value_to_string(v)))
        .collect())
}

fn toml_mapping(path: &Path, content: &str, select: Option<&str>) -> Result<Mapping, SourceError> {
    let root: toml::Table = toml::from_str(content).map_err(|source| SourceError::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    let mut table = &root;
    if let Some(select) = select {
        for segment in select.split('.') {
            table = match table.get(segment) {
                Some(toml::Value::Table(inner)) => inner,
                Some(_) => {
                    return Err(SourceError::NotATable {
                        path: path.to_path_buf(),
                        select: select.to_string(),
                    })
                }
                None => {
                    return Err(SourceError::SelectionNotFound {
                        path: path.to_path_buf(),
                        select: select.to_string(),
                    })
                }
            };
        }
    }

    Ok(table
        .iter()
        .map(|(k, v)| (k.clone(), toml_value_to_string(v)))
        .collect())
}

/// Strings verbatim, everything else in its compact textual form
pub fn json_value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strings verbatim, everything else in its TOML textual form
pub fn toml_value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert an inline table of TOML values into a mapping
pub fn from_toml_values<'a>(
    values: impl IntoIterator<Item = (&'a String, &'a toml::Value)>,
) -> Mapping {
    values
        .into_iter()
        .map(|(k, v)| (k.clone(), toml_value_to_string(v)))
        .collect()
}

fn retain_keys(mut mapping: Mapping, keys: &[String]) -> Mapping {
    mapping.retain(|k, _| keys.iter().any(|wanted| wanted == k));
    mapping
}

/// Parse a `KEY=VALUE` assignment; the value may itself contain `=`
pub fn parse_assignment(arg: &str) -> Result<(String, String), SourceError> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(SourceError::InvalidAssignment(arg.to_string())),
    }
}

/// Collect assignments into one mapping; a repeated key keeps its first value
pub fn from_assignments<S: AsRef<str>>(args: &[S]) -> Result<Mapping, SourceError> {
    let mut mapping = Mapping::new();
    for arg in args {
        let (key, value) = parse_assignment(arg.as_ref())?;
        mapping.entry(key).or_insert(value);
    }
    Ok(mapping)
}

/// Environment variables starting with `prefix`, keyed without the prefix
pub fn from_env(prefix: &str) -> Mapping {
    from_vars(std::env::vars(), prefix)
}

fn from_vars(vars: impl Iterator<Item = (String, String)>, prefix: &str) -> Mapping {
    vars.filter_map(|(name, value)| {
        let key = name.strip_prefix(prefix)?;
        (!key.is_empty()).then(|| (key.to_string(), value))
    })
    .collect()
}
