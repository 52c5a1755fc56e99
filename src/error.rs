//! Error types for engine construction

use thiserror::Error;

/// Errors that can occur while constructing an [`Engine`](crate::Engine)
///
/// These are fatal: no partial engine is ever returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No replacement source was supplied
    #[error("substitutions missing")]
    MissingReplacements,

    /// Custom prefix contains characters outside `[A-Za-z0-9]`
    #[error("invalid prefix '{prefix}', only [a-zA-Z0-9] allowed")]
    InvalidPrefix { prefix: String },

    /// A custom prefix was requested together with unprefixed matching
    #[error("prefix '{prefix}' cannot be combined with unprefixed placeholders")]
    ConflictingModes { prefix: String },

    /// The placeholder pattern could not be compiled
    #[error("failed to build placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl ConfigError {
    /// Create an invalid prefix error
    pub fn invalid_prefix(prefix: impl Into<String>) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
        }
    }
}
