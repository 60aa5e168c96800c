//! Parser facade.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::ast::Program;
use crate::diagnostics::Diagnostics;
use crate::error::{ParseError, Result};
use crate::lexer::{normalize, tokenize};
use crate::options::ParseOptions;
use crate::parser::{build_program, parse_tokens};

/// Entry point for parsing QASM3 source with a fixed set of options.
///
/// The parser holds no per-call state, so one instance can be shared between
/// threads.
///
/// ```
/// use qasmparser::{ParseOptions, QasmParser};
///
/// let parser = QasmParser::with_options(ParseOptions::default().with_include_comments(false));
/// let program = parser.parse_str("// bell\nqubit[2] q;\nh q[0];\n").unwrap();
/// assert!(program.comments.is_empty());
/// assert_eq!(program.statements.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct QasmParser {
    options: ParseOptions,
}

impl QasmParser {
    /// Create a parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse source text, failing on the first diagnostic.
    pub fn parse_str(&self, text: &str) -> Result<Program> {
        let result = self.parse_with_diagnostics(text);
        match result.diagnostics.into_iter().next() {
            Some(first) => Err(first.into()),
            None => Ok(result.program),
        }
    }

    /// Parse source text, returning the best-effort tree and every diagnostic
    /// collected up to the configured limit.
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn parse_with_diagnostics(&self, text: &str) -> ParseResult {
        let source = normalize(text);
        let mut diagnostics = Diagnostics::new(self.options.error_limit());

        let stream = tokenize(&source, &mut diagnostics);
        let tree = parse_tokens(&stream.tokens, &self.options, &mut diagnostics);
        let program = build_program(&source, &stream, tree, self.options.include_comments);

        if diagnostics.dropped() > 0 {
            debug!(dropped = diagnostics.dropped(), "diagnostic limit reached");
        }
        debug!(
            statements = program.statements.len(),
            errors = diagnostics.len(),
            "parsed program"
        );

        ParseResult {
            program,
            diagnostics: diagnostics.into_vec(),
        }
    }

    /// Check source text for errors without building an AST.
    #[instrument(skip_all, fields(len = text.len()))]
    pub fn validate(&self, text: &str) -> Result<()> {
        let source = normalize(text);
        // Only the earliest diagnostic is reported.
        let mut diagnostics = Diagnostics::new(Some(1));

        let stream = tokenize(&source, &mut diagnostics);
        parse_tokens(&stream.tokens, &self.options, &mut diagnostics);

        match diagnostics.into_vec().into_iter().next() {
            Some(first) => {
                debug!(error = %first, "validation failed");
                Err(first.into())
            }
            None => Ok(()),
        }
    }

    /// Read all of `reader` and parse it.
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Program> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        self.parse_str(&text)
    }

    /// Read a file and parse it.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Program> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading source file");
        let text = std::fs::read_to_string(path)?;
        self.parse_str(&text)
    }
}

/// Outcome of [`QasmParser::parse_with_diagnostics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    program: Program,
    diagnostics: Vec<ParseError>,
}

impl ParseResult {
    /// The best-effort tree. Always present, possibly empty.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Diagnostics in source order.
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn first_error(&self) -> Option<&ParseError> {
        self.diagnostics.first()
    }

    /// Rendered diagnostic messages.
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    pub fn into_parts(self) -> (Program, Vec<ParseError>) {
        (self.program, self.diagnostics)
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.diagnostics.is_empty() {
            return write!(f, "No errors");
        }
        for (i, err) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {err}", i + 1)?;
        }
        Ok(())
    }
}

/// Parse source text with default options.
pub fn parse(text: &str) -> Result<Program> {
    QasmParser::new().parse_str(text)
}

/// Validate source text with default options.
pub fn validate(text: &str) -> Result<()> {
    QasmParser::new().validate(text)
}
