//! The substitution engine

use crate::error::ConfigError;

use super::diagnostic::{Diagnostic, DiagnosticKind};
use super::pattern::{Matcher, PatternMode, TokenMatch};
use super::table::{ReplacementTable, Replacements};

/// Options for building an [`Engine`]
#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    /// Replacement sources; required
    pub replacements: Option<Replacements>,
    /// Custom prefix for `@prefix.key@` tokens
    pub prefix: Option<String>,
    /// Match `@key@` tokens without any prefix
    pub unprefixed: bool,
    /// Log the prefix mode and merged table at construction
    pub debug: bool,
}

impl TemplateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the replacement sources
    pub fn with_replacements(mut self, replacements: impl Into<Replacements>) -> Self {
        self.replacements = Some(replacements.into());
        self
    }

    /// Require a custom prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Enable or disable unprefixed placeholders
    pub fn with_unprefixed(mut self, unprefixed: bool) -> Self {
        self.unprefixed = unprefixed;
        self
    }

    /// Enable or disable debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// A document to render
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub text: &'a str,
    /// Label used in diagnostics, usually the path relative to the source directory
    pub path_label: &'a str,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str, path_label: &'a str) -> Self {
        Self { text, path_label }
    }
}

/// Result of rendering one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl Rendered {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolves placeholder tokens against a merged replacement table
#[derive(Debug, Clone)]
pub struct Engine {
    table: ReplacementTable,
    matcher: Matcher,
}

impl Engine {
    /// Validate the configuration and build the engine
    pub fn new(config: TemplateConfig) -> Result<Self, ConfigError> {
        let replacements = config
            .replacements
            .ok_or(ConfigError::MissingReplacements)?;
        let mode = PatternMode::select(config.prefix.as_deref(), config.unprefixed)?;
        let matcher = Matcher::new(mode)?;
        let table = ReplacementTable::build(replacements);

        if config.debug {
            tracing::info!(prefix = %matcher.mode(), "placeholder mode");
            for (key, value) in table.iter() {
                tracing::info!(key, value, "replacement");
            }
        }

        Ok(Self { table, matcher })
    }

    pub fn mode(&self) -> &PatternMode {
        self.matcher.mode()
    }

    pub fn table(&self) -> &ReplacementTable {
        &self.table
    }

    /// Render a document, collecting diagnostics
    pub fn apply(&self, document: &Document<'_>) -> Rendered {
        let mut diagnostics = Vec::new();
        let text = self.apply_with(document, |d| diagnostics.push(d));
        Rendered { text, diagnostics }
    }

    /// Render a document, handing each diagnostic to `sink` as it occurs
    pub fn apply_with<F>(&self, document: &Document<'_>, mut sink: F) -> String
    where
        F: FnMut(Diagnostic),
    {
        let source = document.text;
        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        for token in self.matcher.find_iter(source) {
            out.push_str(&source[last..token.span.start]);
            match self.resolve(&token) {
                Ok(value) => out.push_str(value),
                Err(kind) => {
                    tracing::debug!(token = token.text, path = document.path_label, "unresolved");
                    sink(Diagnostic::new(
                        source,
                        token.span.clone(),
                        document.path_label,
                        kind,
                    ));
                }
            }
            last = token.span.end;
        }
        out.push_str(&source[last..]);
        out
    }

    fn resolve<'s>(&'s self, token: &TokenMatch<'_>) -> Result<&'s str, DiagnosticKind> {
        if let PatternMode::Prefixed(prefix) = self.matcher.mode() {
            if !token.has_prefix_segment {
                return Err(DiagnosticKind::MissingPrefix {
                    prefix: prefix.clone(),
                });
            }
        }
        self.table
            .get(token.key)
            .ok_or_else(|| DiagnosticKind::MissingReplacement {
                key: token.key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Mapping;
    use pretty_assertions::assert_eq;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn engine(config: TemplateConfig) -> Engine {
        Engine::new(config).unwrap()
    }

    #[test]
    fn test_missing_replacements_is_error() {
        let result = Engine::new(TemplateConfig::new());
        assert!(matches!(result, Err(ConfigError::MissingReplacements)));
    }

    #[test]
    fn test_invalid_prefix_is_error() {
        let config = TemplateConfig::new()
            .with_replacements(mapping(&[("a", "b")]))
            .with_prefix("bad prefix!");
        assert!(matches!(
            Engine::new(config),
            Err(ConfigError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_empty_prefix_falls_back_to_default() {
        let e = engine(
            TemplateConfig::new()
                .with_replacements(mapping(&[("a", "1")]))
                .with_prefix(""),
        );
        assert_eq!(e.mode(), &PatternMode::Prefixed("package".to_string()));
        let out = e.apply(&Document::new("@package.a@", "a.tmpl"));
        assert_eq!(out.text, "1");
        assert!(out.is_clean());
    }

    #[test]
    fn test_prefixed_substitution() {
        let e = engine(TemplateConfig::new().with_replacements(mapping(&[("title", "X")])));
        let out = e.apply(&Document::new("<title>@package.title@</title>", "a.tmpl"));
        assert_eq!(out.text, "<title>X</title>");
        assert!(out.is_clean());
    }

    #[test]
    fn test_missing_prefix_segment() {
        let e = engine(TemplateConfig::new().with_replacements(mapping(&[("title", "X")])));
        let out = e.apply(&Document::new("<t>@title@</t>", "a.tmpl"));
        assert_eq!(out.text, "<t></t>");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(
            out.diagnostics[0].message(),
            "replacement must start with 'package.'"
        );
    }

    #[test]
    fn test_custom_prefix() {
        let e = engine(
            TemplateConfig::new()
                .with_replacements(mapping(&[("name", "demo")]))
                .with_prefix("app"),
        );
        let out = e.apply(&Document::new("@app.name@ @package.name@", "a.tmpl"));
        assert_eq!(out.text, "demo ");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(
            out.diagnostics[0].message(),
            "replacement must start with 'app.'"
        );
    }

    #[test]
    fn test_unprefixed_missing_key() {
        let e = engine(
            TemplateConfig::new()
                .with_replacements(mapping(&[("title", "X")]))
                .with_unprefixed(true),
        );
        let out = e.apply(&Document::new("[@unknownKey@] [@title@]", "a.tmpl"));
        assert_eq!(out.text, "[] [X]");
        assert_eq!(out.diagnostics.len(), 1);
        assert!(out.diagnostics[0].message().contains("has no replacement!"));
        assert_eq!(
            out.diagnostics[0].kind,
            DiagnosticKind::MissingReplacement {
                key: "unknownKey".to_string()
            }
        );
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let e = engine(
            TemplateConfig::new()
                .with_replacements(mapping(&[("v", "1.2.3")]))
                .with_unprefixed(true),
        );
        let out = e.apply(&Document::new("@v@\n  @v@  \n\t@v@", "a.tmpl"));
        assert_eq!(out.text, "1.2.3\n  1.2.3  \n\t1.2.3");
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let e = engine(TemplateConfig::new().with_replacements(Mapping::new()));
        let source = "no placeholders, just an @ sign";
        assert_eq!(e.apply(&Document::new(source, "a.tmpl")).text, source);
    }

    #[test]
    fn test_apply_with_sink() {
        let e = engine(TemplateConfig::new().with_replacements(Mapping::new()));
        let mut seen = Vec::new();
        let text = e.apply_with(&Document::new("@package.a@@package.b@", "x"), |d| {
            seen.push(d.token)
        });
        assert_eq!(text, "");
        assert_eq!(seen, vec!["@package.a@", "@package.b@"]);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn build_logged(config: TemplateConfig) -> (Engine, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let e = tracing::subscriber::with_default(subscriber, || engine(config));
        (e, captured.contents())
    }

    #[test]
    fn test_debug_logs_mode_and_merged_table() {
        let (e, logs) = build_logged(
            TemplateConfig::new()
                .with_replacements(vec![mapping(&[("a", "1")]), mapping(&[("a", "2")])])
                .with_debug(true),
        );
        assert!(logs.contains("placeholder mode"));
        assert!(logs.contains("prefix=package"));
        assert!(logs.contains("key=\"a\""));
        assert!(logs.contains("value=\"1\""));
        assert!(!logs.contains("value=\"2\""));
        assert_eq!(e.apply(&Document::new("@package.a@", "x")).text, "1");
    }

    #[test]
    fn test_debug_off_logs_nothing() {
        let (_, logs) = build_logged(
            TemplateConfig::new()
                .with_replacements(mapping(&[("a", "1")]))
                .with_unprefixed(true),
        );
        assert_eq!(logs, "");
    }

    #[test]
    fn test_diagnostic_location() {
        let e = engine(
            TemplateConfig::new()
                .with_replacements(Mapping::new())
                .with_unprefixed(true),
        );
        let out = e.apply(&Document::new("a\nb\n@x@", "dir/file.xml.tmpl"));
        let diag = &out.diagnostics[0];
        assert_eq!(diag.line, 3);
        assert_eq!(diag.path, "dir/file.xml.tmpl");
        assert_eq!(diag.span, 4..7);
    }
}
