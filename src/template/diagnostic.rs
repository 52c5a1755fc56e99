//! Diagnostics for placeholders that could not be resolved
//!
//! A diagnostic never aborts substitution: the offending token is replaced by
//! the empty string and the diagnostic is handed to the caller, who decides
//! whether it is fatal.

use std::fmt;
use std::ops::Range;

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};

/// Characters of context shown on each side of a failing token
pub const CONTEXT_CHARACTERS: usize = 20;

const ELLIPSIS: &str = "...";

/// Why a token could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The token lacks the required `prefix.` segment
    MissingPrefix { prefix: String },
    /// The key is not in the replacement table
    MissingReplacement { key: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingPrefix { prefix } => {
                write!(f, "replacement must start with '{}.'", prefix)
            }
            DiagnosticKind::MissingReplacement { .. } => write!(f, "has no replacement!"),
        }
    }
}

/// Text surrounding a failing token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub before: String,
    pub after: String,
    /// More text precedes `before`
    pub leading_ellipsis: bool,
    /// More text follows `after`
    pub trailing_ellipsis: bool,
}

impl Context {
    /// Extract up to [`CONTEXT_CHARACTERS`] characters on each side of `span`
    pub fn around(source: &str, span: &Range<usize>) -> Self {
        let head = &source[..span.start];
        let tail = &source[span.end..];

        let before_start = head
            .char_indices()
            .rev()
            .nth(CONTEXT_CHARACTERS - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let after_end = tail
            .char_indices()
            .nth(CONTEXT_CHARACTERS)
            .map(|(i, _)| i)
            .unwrap_or(tail.len());

        Self {
            before: head[before_start..].to_string(),
            after: tail[..after_end].to_string(),
            leading_ellipsis: before_start > 0,
            trailing_ellipsis: after_end < tail.len(),
        }
    }
}

/// 1-based line of the byte `offset`
pub fn line_number(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// A non-fatal report about one failed substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The token as written in the document
    pub token: String,
    /// Byte range of the token in the document
    pub span: Range<usize>,
    pub line: usize,
    /// Path label of the document
    pub path: String,
    pub context: Context,
}

impl Diagnostic {
    /// Build a diagnostic for the token at `span` in `source`
    pub fn new(source: &str, span: Range<usize>, path: &str, kind: DiagnosticKind) -> Self {
        Self {
            kind,
            token: source[span.clone()].to_string(),
            line: line_number(source, span.start),
            context: Context::around(source, &span),
            path: path.to_string(),
            span,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Context snippet with the token delineated
    ///
    /// With `color` the token is printed in red, otherwise it is wrapped in
    /// `>>` and `<<`.
    pub fn snippet(&self, color: bool) -> String {
        format!(
            "{}{}{}{}{}",
            if self.context.leading_ellipsis { ELLIPSIS } else { "" },
            self.context.before,
            self.highlighted_token(color),
            self.context.after,
            if self.context.trailing_ellipsis { ELLIPSIS } else { "" },
        )
    }

    /// Three-line operator report: token and message, location, snippet
    pub fn render(&self, color: bool) -> String {
        format!(
            "{} {}\nFound at line {} in {}\n{}",
            self.highlighted_token(color),
            self.kind,
            self.line,
            self.path,
            self.snippet(color)
        )
    }

    /// Render the diagnostic against the full source using ariadne
    pub fn format_report(&self, source: &str, color: bool) -> String {
        let path = self.path.as_str();
        // ariadne spans count characters, not bytes
        let start = source[..self.span.start].chars().count();
        let end = start + self.token.chars().count();

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Warning, path, start)
            .with_config(Config::default().with_color(color))
            .with_message(format!("{} {}", self.token, self.kind))
            .with_label(
                Label::new((path, start..end))
                    .with_message(self.kind.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((path, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.render(color),
        }
    }

    fn highlighted_token(&self, color: bool) -> String {
        if color {
            self.token.as_str().fg(Color::Red).to_string()
        } else {
            format!(">>{}<<", self.token)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(false))
    }
}
