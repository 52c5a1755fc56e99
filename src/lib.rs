//! tmpl-replace - placeholder substitution for package templates
//!
//! Renders `.tmpl` files (such as `expath-pkg.xml.tmpl` or `repo.xml.tmpl`)
//! by replacing `@package.key@` / `@key@` placeholders with values merged from
//! project metadata sources.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tmpl_replace::{substitute, TemplateConfig};
//!
//! let mut values = BTreeMap::new();
//! values.insert("title".to_string(), "Demo".to_string());
//!
//! let out = substitute(
//!     "<title>@package.title@</title>",
//!     "repo.xml.tmpl",
//!     TemplateConfig::new().with_replacements(values),
//! )
//! .unwrap();
//! assert_eq!(out.text, "<title>Demo</title>");
//! assert!(out.diagnostics.is_empty());
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod template;

pub use config::{ProjectConfig, ProjectError};
pub use error::ConfigError;
pub use pipeline::{FileReport, PipelineError, TemplateJob};
pub use source::SourceError;
pub use template::{
    Diagnostic, DiagnosticKind, Document, Engine, Mapping, Rendered, ReplacementTable,
    Replacements, TemplateConfig,
};

/// Render a single document with a freshly built engine
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
/// use tmpl_replace::{substitute, TemplateConfig};
///
/// let mut values = BTreeMap::new();
/// values.insert("version".to_string(), "1.0.0".to_string());
///
/// let config = TemplateConfig::new()
///     .with_replacements(values)
///     .with_unprefixed(true);
/// let out = substitute("v@version@ @missing@", "a.tmpl", config).unwrap();
///
/// assert_eq!(out.text, "v1.0.0 ");
/// assert_eq!(out.diagnostics.len(), 1);
/// ```
pub fn substitute(
    text: &str,
    path_label: &str,
    config: TemplateConfig,
) -> Result<Rendered, ConfigError> {
    let engine = Engine::new(config)?;
    Ok(engine.apply(&Document::new(text, path_label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_requires_replacements() {
        let result = substitute("@package.a@", "a.tmpl", TemplateConfig::new());
        assert!(matches!(result, Err(ConfigError::MissingReplacements)));
    }

    #[test]
    fn test_substitute_reports_missing_key() {
        let out = substitute(
            "@package.a@",
            "a.tmpl",
            TemplateConfig::new().with_replacements(Mapping::new()),
        )
        .unwrap();
        assert_eq!(out.text, "");
        assert_eq!(out.diagnostics[0].message(), "has no replacement!");
    }
}
