//! Placeholder substitution for `.tmpl` files
//!
//! Placeholders are `@key@` tokens, or `@prefix.key@` when a prefix is
//! required (the default prefix is `package`). Each token is resolved against
//! a replacement table merged from one or more sources; tokens that cannot be
//! resolved are replaced by the empty string and reported as diagnostics.
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tmpl_replace::template::{Document, Engine, TemplateConfig};
//!
//! let mut values = BTreeMap::new();
//! values.insert("version".to_string(), "1.0.0".to_string());
//!
//! let engine = Engine::new(TemplateConfig::new().with_replacements(values)).unwrap();
//! let out = engine.apply(&Document::new("<version>@package.version@</version>", "expath-pkg.xml.tmpl"));
//! assert_eq!(out.text, "<version>1.0.0</version>");
//! ```

mod diagnostic;
mod engine;
mod pattern;
mod table;

pub use diagnostic::{line_number, Context, Diagnostic, DiagnosticKind, CONTEXT_CHARACTERS};
pub use engine::{Document, Engine, Rendered, TemplateConfig};
pub use pattern::{Matcher, PatternMode, TokenMatch, DEFAULT_PREFIX};
pub use table::{Mapping, ReplacementTable, Replacements};
