//! Parser for `OpenQASM` 3.
//!
//! The grammar parser works on the significant tokens produced by
//! [`tokenize`](crate::lexer::tokenize) and builds a [`SyntaxTree`] whose nodes
//! point back into the token stream. Syntax errors are recorded in the shared
//! [`Diagnostics`] and never abort the parse: the statement loop resynchronizes
//! and leaves a skipped-tokens placeholder in the tree.

mod builder;
mod expression;
mod statement;
mod tree;

pub(crate) use builder::build_program;
pub(crate) use tree::SyntaxTree;

use tracing::trace;

use crate::diagnostics::Diagnostics;
use crate::error::ParseError;
use crate::lexer::{SpannedToken, Token};
use crate::options::ParseOptions;
use crate::span::Span;
use tree::{StmtNode, TokenRange};

/// Result of a single grammar production.
pub(crate) type SyntaxResult<T> = Result<T, ParseError>;

/// Deepest nesting of expressions and `{ }` blocks accepted in one statement.
pub(crate) const MAX_DEPTH: usize = 128;

/// Run the grammar parser over a token stream ending with [`Token::Eof`].
pub(crate) fn parse_tokens(
    tokens: &[SpannedToken<'_>],
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> SyntaxTree {
    Parser::new(tokens, options, diagnostics).parse_program()
}

/// Parser state.
pub(super) struct Parser<'t, 'src, 'd> {
    pub(super) tokens: &'t [SpannedToken<'src>],
    pub(super) pos: usize,
    pub(super) strict: bool,
    recovery: bool,
    /// Number of `{ }` blocks currently open.
    block_depth: usize,
    /// Current expression and block nesting, bounded by [`MAX_DEPTH`].
    depth: usize,
    /// Whether any statement has been parsed yet (the version pragma must come first).
    pub(super) seen_statement: bool,
    diagnostics: &'d mut Diagnostics,
}

impl<'t, 'src, 'd> Parser<'t, 'src, 'd> {
    fn new(
        tokens: &'t [SpannedToken<'src>],
        options: &ParseOptions,
        diagnostics: &'d mut Diagnostics,
    ) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.token == Token::Eof),
            "token stream must end with Eof"
        );
        Self {
            tokens,
            pos: 0,
            strict: options.strict_mode,
            recovery: options.error_recovery,
            block_depth: 0,
            depth: 0,
            seen_statement: false,
            diagnostics,
        }
    }

    /// The current token. Past the end this is the trailing `Eof`.
    pub(super) fn current(&self) -> &'t SpannedToken<'src> {
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Token {
        self.current().token
    }

    /// Peek `n` tokens ahead of the current one.
    pub(super) fn peek_nth(&self, n: usize) -> Token {
        self.tokens
            .get(self.pos + n)
            .map_or(Token::Eof, |t| t.token)
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.peek() == Token::Eof
    }

    /// Advance past the current token, returning its index. Never moves past `Eof`.
    pub(super) fn advance(&mut self) -> usize {
        let index = self.pos;
        if !self.is_eof() {
            self.pos += 1;
        }
        index
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(&self.peek()) == std::mem::discriminant(token)
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token, returning its index.
    pub(super) fn expect(&mut self, expected: &Token) -> SyntaxResult<usize> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{expected}'")))
        }
    }

    /// Expect an identifier, returning its index.
    pub(super) fn expect_identifier(&mut self) -> SyntaxResult<usize> {
        if self.check(&Token::Identifier) {
            Ok(self.advance())
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    /// Parse a comma separated identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> SyntaxResult<Vec<usize>> {
        let mut ids = vec![self.expect_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.expect_identifier()?);
        }
        Ok(ids)
    }

    /// Expect the `;` ending a statement.
    ///
    /// A missing terminator is reported at the next token. If that token sits on
    /// a later line, closes a block, or can only start a statement, the current
    /// statement is accepted as complete.
    pub(super) fn expect_terminator(&mut self) -> SyntaxResult<()> {
        if self.consume(&Token::Semicolon) {
            return Ok(());
        }

        let err = self.unexpected("';'");
        let next = self.current();
        let prev_line = self.pos.checked_sub(1).map_or(0, |i| self.tokens[i].span.end.line);

        if next.token == Token::Eof
            || next.token == Token::RBrace
            || next.token.starts_statement()
            || next.span.start.line > prev_line
        {
            self.report(err);
            Ok(())
        } else {
            Err(err)
        }
    }

    /// A syntax error at the current token.
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        let found = self.current();
        ParseError::syntax(
            format!("expected {expected}, found {}", describe(found)),
            found.span,
        )
    }

    /// Record a diagnostic without interrupting the current production.
    pub(super) fn report(&mut self, err: ParseError) {
        self.diagnostics.push(err);
    }

    /// Record a strict-mode violation at token `index`.
    pub(super) fn report_strict(&mut self, index: usize, message: &str) {
        let span = self.tokens[index].span;
        self.report(ParseError::syntax(message, span).with_context("strict mode"));
    }

    /// Enter one nesting level, failing at the current token once the limit is reached.
    pub(super) fn descend(&mut self) -> SyntaxResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::syntax(
                "maximum nesting depth exceeded",
                self.current().span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave `levels` nesting levels entered with [`Parser::descend`].
    pub(super) fn ascend(&mut self, levels: usize) {
        self.depth -= levels;
    }

    /// Whether the parser is inside a `{ }` block.
    pub(super) fn in_block(&self) -> bool {
        self.block_depth > 0
    }

    /// Token range from `start` up to the last consumed token.
    pub(super) fn range_from(&self, start: usize) -> TokenRange {
        TokenRange::new(start, self.pos.saturating_sub(1).max(start))
    }

    /// Source span of token `index`.
    pub(super) fn span_of(&self, index: usize) -> Span {
        self.tokens[index].span
    }

    /// Parse the entire program.
    fn parse_program(mut self) -> SyntaxTree {
        let statements = self.parse_statements();
        trace!(statements = statements.len(), "parsed program");
        SyntaxTree { statements }
    }

    /// Parse statements until end of input or the `}` closing the current block.
    pub(super) fn parse_statements(&mut self) -> Vec<StmtNode> {
        let mut statements = Vec::new();

        while !self.is_eof() && !(self.block_depth > 0 && self.check(&Token::RBrace)) {
            let start = self.pos;
            // A failed production leaves its levels entered.
            let depth = self.depth;
            let parsed = self.parse_statement();
            self.depth = depth;
            match parsed {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    let err = if err.context.is_none() {
                        err.with_context(self.statement_context(start))
                    } else {
                        err
                    };
                    self.report(err);
                    self.recover(start);
                    if self.pos > start {
                        statements.push(StmtNode::Skipped {
                            range: self.range_from(start),
                        });
                    }
                }
            }
            self.seen_statement = true;
        }

        statements
    }

    /// Parse `{ statements }`.
    pub(super) fn parse_block(&mut self) -> SyntaxResult<Vec<StmtNode>> {
        self.descend()?;
        self.expect(&Token::LBrace)?;
        self.block_depth += 1;
        let body = self.parse_statements();
        self.block_depth -= 1;
        self.expect(&Token::RBrace)?;
        self.ascend(1);
        Ok(body)
    }

    /// Move past a malformed statement that began at token `start`.
    fn recover(&mut self, start: usize) {
        if self.recovery {
            self.synchronize(start);
        } else if self.pos == start {
            self.advance();
        }
        trace!(
            from = start,
            to = self.pos,
            recovery = self.recovery,
            "skipped malformed statement"
        );
    }

    /// Discard tokens up to the next statement boundary.
    ///
    /// Stops after a `;`, after a whole `{ }` block, or before a `}` closing an
    /// enclosing block. Always consumes at least one token.
    fn synchronize(&mut self, start: usize) {
        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Semicolon => {
                    self.advance();
                    break;
                }
                Token::LBrace => {
                    self.skip_balanced();
                    break;
                }
                Token::RBrace if self.block_depth > 0 && self.pos > start => break,
                Token::RBrace => {
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }

        if self.pos == start {
            self.advance();
        }
    }

    /// Skip a bracketed group starting at the current `(`, `[` or `{`.
    pub(super) fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                Token::Eof => return,
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Name of the construct a statement starting at `start` belongs to.
    fn statement_context(&self, start: usize) -> &'static str {
        let next = self.tokens.get(start + 1).map(|t| t.token);
        match self.tokens[start].token {
            Token::OpenQasm => "version pragma",
            Token::Include => "include",
            Token::Qubit | Token::QReg => "quantum declaration",
            Token::Const | Token::Input | Token::Output | Token::CReg => "classical declaration",
            t if t.is_classical_type() => "classical declaration",
            Token::Measure => "measurement",
            Token::Reset => "reset",
            Token::Barrier => "barrier",
            Token::Gate => "gate declaration",
            Token::If | Token::Else => "if statement",
            Token::For => "for loop",
            Token::While => "while loop",
            Token::Def => "subroutine definition",
            Token::Return | Token::Break | Token::Continue | Token::End => "control statement",
            Token::Identifier
                if matches!(
                    next,
                    Some(
                        Token::LBracket
                            | Token::Eq
                            | Token::PlusEq
                            | Token::MinusEq
                            | Token::StarEq
                            | Token::SlashEq
                    )
                ) =>
            {
                "assignment"
            }
            Token::Identifier | Token::Inv | Token::Pow | Token::Ctrl | Token::NegCtrl => {
                "gate call"
            }
            _ => "statement",
        }
    }
}

/// How a token is named in diagnostics.
fn describe(token: &SpannedToken<'_>) -> String {
    match token.token {
        Token::Eof => "end of input".to_string(),
        _ => format!("'{}'", token.text),
    }
}
