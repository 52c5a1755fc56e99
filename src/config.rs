//! Project configuration for the templates step
//!
//! A TOML file describing where `.tmpl` files live, where rendered files go,
//! how placeholders are shaped, and the ordered list of replacement sources.
//!
//! ```toml
//! [templates]
//! output_dir = "build"
//! unprefixed = true
//!
//! # first source wins on duplicate keys
//! [[replacements]]
//! file = ".existdb.json"
//! select = "/package"
//!
//! [[replacements]]
//! file = "package.json"
//! keys = ["version", "license"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::ConfigError;
use crate::pipeline::TemplateJob;
use crate::source::{self, SourceError};
use crate::template::{Engine, Mapping, Replacements, TemplateConfig};

/// Errors that can occur when loading or applying a project file
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("failed to read project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse project TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to load replacements: {0}")]
    Source(#[from] SourceError),
    #[error("invalid template configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A parsed project file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub replacements: Vec<SourceSpec>,
}

/// The `[templates]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Template file extension, without the dot
    pub extension: String,
    pub recursive: bool,
    pub prefix: Option<String>,
    pub unprefixed: bool,
    pub debug: bool,
    /// Treat diagnostics as a failure
    pub strict: bool,
}

impl Default for TemplatesSection {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("build"),
            extension: "tmpl".to_string(),
            recursive: false,
            prefix: None,
            unprefixed: false,
            debug: false,
            strict: false,
        }
    }
}

/// One `[[replacements]]` entry
///
/// The entry kind is decided by its keys; unknown keys are rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    File(FileSource),
    Inline(InlineSource),
    Env(EnvSource),
}

/// A JSON or TOML file, optionally narrowed to a nested table and a key list
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSource {
    pub file: PathBuf,
    #[serde(default)]
    pub select: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

/// Values written directly in the project file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineSource {
    pub values: BTreeMap<String, toml::Value>,
}

/// Environment variables sharing a prefix
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvSource {
    pub env: String,
}

impl SourceSpec {
    /// Load the mapping, resolving relative file paths against `base_dir`
    pub fn load(&self, base_dir: &Path) -> Result<Mapping, SourceError> {
        match self {
            SourceSpec::File(FileSource { file, select, keys }) => {
                source::load_file(&base_dir.join(file), select.as_deref(), keys.as_deref())
            }
            SourceSpec::Inline(InlineSource { values }) => Ok(source::from_toml_values(values)),
            SourceSpec::Env(EnvSource { env }) => Ok(source::from_env(env)),
        }
    }
}

impl ProjectConfig {
    /// Load a project file
    pub fn from_file(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a project file from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ProjectError> {
        Ok(toml::from_str(content)?)
    }

    /// Load every replacement source, in declaration order
    pub fn load_sources(&self, base_dir: &Path) -> Result<Vec<Mapping>, ProjectError> {
        self.replacements
            .iter()
            .map(|spec| spec.load(base_dir).map_err(ProjectError::from))
            .collect()
    }

    /// Engine options for this project
    ///
    /// An empty `[[replacements]]` list counts as no replacements at all.
    pub fn template_config(&self, base_dir: &Path) -> Result<TemplateConfig, ProjectError> {
        let sources = self.load_sources(base_dir)?;
        let section = &self.templates;
        Ok(TemplateConfig {
            replacements: (!sources.is_empty()).then_some(Replacements::Ordered(sources)),
            prefix: section.prefix.clone(),
            unprefixed: section.unprefixed,
            debug: section.debug,
        })
    }

    /// Build the engine for this project
    pub fn engine(&self, base_dir: &Path) -> Result<Engine, ProjectError> {
        Ok(Engine::new(self.template_config(base_dir)?)?)
    }

    /// Directories and extension for the pipeline, relative to `base_dir`
    pub fn job(&self, base_dir: &Path) -> TemplateJob {
        let section = &self.templates;
        TemplateJob {
            source_dir: base_dir.join(&section.source_dir),
            output_dir: base_dir.join(&section.output_dir),
            extension: section.extension.clone(),
            recursive: section.recursive,
        }
    }
}

/// Directory that relative paths in the project file at `path` resolve against
pub fn base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::from_str("").unwrap();
        assert_eq!(config.templates.output_dir, PathBuf::from("build"));
        assert_eq!(config.templates.extension, "tmpl");
        assert!(!config.templates.unprefixed);
        assert!(config.replacements.is_empty());
    }

    #[test]
    fn test_source_kinds() {
        let config = ProjectConfig::from_str(
            r#"
            [templates]
            unprefixed = true
            debug = true

            [[replacements]]
            file = ".existdb.json"
            select = "/package"

            [[replacements]]
            values = { version = "1.0.0", build = 7 }

            [[replacements]]
            env = "TMPL_"
            "#,
        )
        .unwrap();

        assert!(config.templates.unprefixed);
        assert!(config.templates.debug);
        assert_eq!(config.replacements.len(), 3);
        assert!(matches!(
            &config.replacements[0],
            SourceSpec::File(FileSource { select: Some(s), keys: None, .. }) if s == "/package"
        ));
        assert!(matches!(&config.replacements[1], SourceSpec::Inline(_)));
        assert!(matches!(
            &config.replacements[2],
            SourceSpec::Env(EnvSource { env }) if env == "TMPL_"
        ));
    }

    #[test]
    fn test_inline_values_stringified() {
        let config = ProjectConfig::from_str(
            r#"
            [[replacements]]
            values = { version = "1.0.0", build = 7 }
            "#,
        )
        .unwrap();
        let sources = config.load_sources(Path::new(".")).unwrap();
        assert_eq!(sources[0].get("version").map(String::as_str), Some("1.0.0"));
        assert_eq!(sources[0].get("build").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = ProjectConfig::from_str("[templates]\nprefx = \"app\"\n");
        assert!(matches!(result, Err(ProjectError::Parse(_))));
    }

    #[test]
    fn test_unknown_replacement_field_rejected() {
        let result =
            ProjectConfig::from_str("[[replacements]]\nfile = \"a.json\"\nselct = \"/package\"\n");
        assert!(matches!(result, Err(ProjectError::Parse(_))));

        let result = ProjectConfig::from_str(
            "[[replacements]]\nvalues = { a = \"b\" }\nenv = \"TMPL_\"\n",
        );
        assert!(matches!(result, Err(ProjectError::Parse(_))));
    }

    #[test]
    fn test_no_sources_is_config_error() {
        let config = ProjectConfig::from_str("[templates]\nunprefixed = true\n").unwrap();
        let result = config.engine(Path::new("."));
        assert!(matches!(
            result,
            Err(ProjectError::Config(ConfigError::MissingReplacements))
        ));
    }

    #[test]
    fn test_invalid_prefix_surfaces() {
        let config = ProjectConfig::from_str(
            "[templates]\nprefix = \"my-app\"\n\n[[replacements]]\nvalues = { a = \"b\" }\n",
        )
        .unwrap();
        assert!(matches!(
            config.engine(Path::new(".")),
            Err(ProjectError::Config(ConfigError::InvalidPrefix { .. }))
        ));
    }

    #[test]
    fn test_job_paths_are_relative_to_base() {
        let config = ProjectConfig::from_str("[templates]\nsource_dir = \"src\"\n").unwrap();
        let job = config.job(Path::new("/project"));
        assert_eq!(job.source_dir, PathBuf::from("/project/src"));
        assert_eq!(job.output_dir, PathBuf::from("/project/build"));
    }

    #[test]
    fn test_base_dir() {
        assert_eq!(base_dir(Path::new("tmpl.toml")), PathBuf::from("."));
        assert_eq!(base_dir(Path::new("app/tmpl.toml")), PathBuf::from("app"));
    }
}
