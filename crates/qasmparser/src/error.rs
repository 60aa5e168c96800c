//! Error types for the QASM3 parser.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::Span;

/// Phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Unrecognized character or malformed token.
    Lexical,
    /// Token sequence violates the grammar.
    Syntax,
    /// Well-formed but meaningless construct.
    Semantic,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical"),
            ErrorKind::Syntax => write!(f, "syntax"),
            ErrorKind::Semantic => write!(f, "semantic"),
        }
    }
}

/// A single diagnostic collected while lexing or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} error at {}: {message}{}", format_location(.span), format_context(.context))]
pub struct ParseError {
    /// Human-readable description.
    pub message: String,
    /// Source range the diagnostic refers to; `span.start` is the reported position.
    pub span: Span,
    /// Phase that produced the diagnostic.
    pub kind: ErrorKind,
    /// Enclosing construct, e.g. `"gate call"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

fn format_location(span: &Span) -> String {
    format!("line {}, column {}", span.start.line, span.start.column)
}

fn format_context(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" (context: {ctx})"),
        None => String::new(),
    }
}

impl ParseError {
    /// Create a diagnostic of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
            context: None,
        }
    }

    /// Create a syntax diagnostic.
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    /// Create a lexical diagnostic.
    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexical, message, span)
    }

    /// Create a semantic diagnostic.
    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Semantic, message, span)
    }

    /// Attach the name of the enclosing construct.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// 1-based line of the reported position.
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    /// 1-based column of the reported position.
    pub fn column(&self) -> usize {
        self.span.start.column
    }

    /// Byte offset of the reported position.
    pub fn offset(&self) -> usize {
        self.span.start.offset
    }
}

/// Reasons the lexer rejects a piece of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
pub enum LexErrorKind {
    #[default]
    #[error("unrecognized character")]
    InvalidCharacter,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("integer literal out of range")]
    IntegerOverflow,
}

/// Hard failures returned by the fail-fast entry points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The source has at least one lexical or syntax diagnostic; this is the first.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// The source could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parser options could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The diagnostic behind a [`Error::Syntax`] failure.
    pub fn diagnostic(&self) -> Option<&ParseError> {
        match self {
            Error::Syntax(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for fail-fast parsing operations.
pub type Result<T> = std::result::Result<T, Error>;
