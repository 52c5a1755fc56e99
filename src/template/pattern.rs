//! Placeholder pattern selection and token matching

use std::fmt;
use std::ops::Range;

use regex::Regex;

use crate::error::ConfigError;

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "package";

/// How placeholder tokens are shaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternMode {
    /// `@prefix.key@`
    Prefixed(String),
    /// `@key@`
    Unprefixed,
}

impl Default for PatternMode {
    fn default() -> Self {
        PatternMode::Prefixed(DEFAULT_PREFIX.to_string())
    }
}

impl PatternMode {
    /// Select the mode from the caller's options
    ///
    /// A custom prefix must be ASCII alphanumerics and cannot be combined
    /// with `unprefixed`. An empty prefix counts as no prefix.
    pub fn select(prefix: Option<&str>, unprefixed: bool) -> Result<Self, ConfigError> {
        match (prefix.filter(|p| !p.is_empty()), unprefixed) {
            (Some(p), _) if !is_valid_prefix(p) => Err(ConfigError::invalid_prefix(p)),
            (Some(p), true) => Err(ConfigError::ConflictingModes {
                prefix: p.to_string(),
            }),
            (Some(p), false) => Ok(PatternMode::Prefixed(p.to_string())),
            (None, true) => Ok(PatternMode::Unprefixed),
            (None, false) => Ok(PatternMode::default()),
        }
    }

    /// The required prefix, if any
    pub fn prefix(&self) -> Option<&str> {
        match self {
            PatternMode::Prefixed(p) => Some(p),
            PatternMode::Unprefixed => None,
        }
    }

    fn pattern(&self) -> String {
        match self {
            PatternMode::Prefixed(p) => format!(r"@({}\.)?([^@]+)@", regex::escape(p)),
            PatternMode::Unprefixed => r"@([^@]+)@".to_string(),
        }
    }
}

impl fmt::Display for PatternMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternMode::Prefixed(p) => write!(f, "{}", p),
            PatternMode::Unprefixed => write!(f, "unprefixed"),
        }
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.chars().all(|c| c.is_ascii_alphanumeric())
}

/// A placeholder occurrence found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    /// Byte range of the whole token, delimiters included
    pub span: Range<usize>,
    /// The token text as written, e.g. `@package.title@`
    pub text: &'a str,
    /// Whether the `prefix.` segment was present (always false when unprefixed)
    pub has_prefix_segment: bool,
    /// The lookup key
    pub key: &'a str,
}

/// Compiled matcher for one pattern mode
#[derive(Debug, Clone)]
pub struct Matcher {
    mode: PatternMode,
    regex: Regex,
}

impl Matcher {
    pub fn new(mode: PatternMode) -> Result<Self, ConfigError> {
        let regex = Regex::new(&mode.pattern())?;
        Ok(Self { mode, regex })
    }

    pub fn mode(&self) -> &PatternMode {
        &self.mode
    }

    /// All non-overlapping tokens in `text`, left to right
    pub fn find_iter<'m, 't>(&'m self, text: &'t str) -> impl Iterator<Item = TokenMatch<'t>> + 'm
    where
        't: 'm,
    {
        let prefixed = matches!(self.mode, PatternMode::Prefixed(_));
        self.regex.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let (has_prefix_segment, key) = if prefixed {
                (caps.get(1).is_some(), caps.get(2)?.as_str())
            } else {
                (false, caps.get(1)?.as_str())
            };
            Some(TokenMatch {
                span: whole.range(),
                text: whole.as_str(),
                has_prefix_segment,
                key,
            })
        })
    }
}
