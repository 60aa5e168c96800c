//! Lexer for `OpenQASM` 3.

use std::borrow::Cow;

use logos::Logos;

use crate::diagnostics::Diagnostics;
use crate::error::{LexErrorKind, ParseError};
use crate::span::{Position, Span};

/// Tokens for `OpenQASM` 3.
///
/// Literal variants carry only the value needed for validation; the literal text
/// is always available from [`SpannedToken::text`].
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t\n\f]+")]
pub enum Token {
    // Comments are kept as tokens so they can be attached to the tree.
    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", lex_block_comment)]
    BlockComment,

    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qubit")]
    Qubit,

    #[token("qreg")]
    QReg,

    #[token("bit")]
    Bit,

    #[token("creg")]
    CReg,

    #[token("int")]
    Int,

    #[token("uint")]
    UInt,

    #[token("float")]
    Float,

    #[token("angle")]
    Angle,

    #[token("bool")]
    Bool,

    #[token("const")]
    Const,

    #[token("input")]
    Input,

    #[token("output")]
    Output,

    #[token("gate")]
    Gate,

    #[token("def")]
    Def,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("in")]
    In,

    #[token("return")]
    Return,

    #[token("break")]
    Break,

    #[token("continue")]
    Continue,

    #[token("end")]
    End,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    // Gate modifiers
    #[token("inv")]
    Inv,

    #[token("pow")]
    Pow,

    #[token("ctrl")]
    Ctrl,

    #[token("negctrl")]
    NegCtrl,

    // Constants
    #[token("pi")]
    Pi,

    #[token("tau")]
    Tau,

    #[token("euler")]
    Euler,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", lex_integer)]
    IntLiteral(u64),

    #[regex(r#""[^"\n]*""#)]
    #[regex(r"'[^'\n]*'")]
    #[regex(r#""[^"\n]*"#, unterminated_string)]
    #[regex(r"'[^'\n]*", unterminated_string)]
    StringLiteral,

    #[regex(r"\$[0-9]+", lex_hardware_qubit)]
    HardwareQubit(u64),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("**")]
    Power,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("!")]
    Not,

    #[token("~")]
    Tilde,

    #[token("&")]
    Ampersand,

    #[token("|")]
    Pipe,

    #[token("^")]
    Caret,

    #[token("<<")]
    LShift,

    #[token(">>")]
    RShift,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    /// End of input. Never produced by logos; appended once by [`Lexer`].
    Eof,
}

fn lex_block_comment(lex: &mut logos::Lexer<'_, Token>) -> Result<(), LexErrorKind> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexErrorKind::UnterminatedComment)
        }
    }
}

fn lex_integer(lex: &mut logos::Lexer<'_, Token>) -> Result<u64, LexErrorKind> {
    lex.slice()
        .parse::<u64>()
        .map_err(|_| LexErrorKind::IntegerOverflow)
}

fn lex_hardware_qubit(lex: &mut logos::Lexer<'_, Token>) -> Result<u64, LexErrorKind> {
    lex.slice()[1..]
        .parse::<u64>()
        .map_err(|_| LexErrorKind::IntegerOverflow)
}

fn unterminated_string(_lex: &mut logos::Lexer<'_, Token>) -> Result<(), LexErrorKind> {
    Err(LexErrorKind::UnterminatedString)
}

impl Token {
    /// Whether this token is a comment.
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::BlockComment)
    }

    /// Whether this token can only appear at the start of a statement.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            Token::OpenQasm
                | Token::Include
                | Token::Qubit
                | Token::QReg
                | Token::Bit
                | Token::CReg
                | Token::Int
                | Token::UInt
                | Token::Float
                | Token::Angle
                | Token::Bool
                | Token::Const
                | Token::Input
                | Token::Output
                | Token::Gate
                | Token::Def
                | Token::If
                | Token::For
                | Token::While
                | Token::Return
                | Token::Break
                | Token::Continue
                | Token::End
                | Token::Reset
                | Token::Barrier
                | Token::Inv
                | Token::Pow
                | Token::Ctrl
                | Token::NegCtrl
        )
    }

    /// Whether this token names a classical type.
    pub fn is_classical_type(&self) -> bool {
        matches!(
            self,
            Token::Bit | Token::Int | Token::UInt | Token::Float | Token::Angle | Token::Bool
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LineComment => write!(f, "line comment"),
            Token::BlockComment => write!(f, "block comment"),
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qubit => write!(f, "qubit"),
            Token::QReg => write!(f, "qreg"),
            Token::Bit => write!(f, "bit"),
            Token::CReg => write!(f, "creg"),
            Token::Int => write!(f, "int"),
            Token::UInt => write!(f, "uint"),
            Token::Float => write!(f, "float"),
            Token::Angle => write!(f, "angle"),
            Token::Bool => write!(f, "bool"),
            Token::Const => write!(f, "const"),
            Token::Input => write!(f, "input"),
            Token::Output => write!(f, "output"),
            Token::Gate => write!(f, "gate"),
            Token::Def => write!(f, "def"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::While => write!(f, "while"),
            Token::In => write!(f, "in"),
            Token::Return => write!(f, "return"),
            Token::Break => write!(f, "break"),
            Token::Continue => write!(f, "continue"),
            Token::End => write!(f, "end"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::Inv => write!(f, "inv"),
            Token::Pow => write!(f, "pow"),
            Token::Ctrl => write!(f, "ctrl"),
            Token::NegCtrl => write!(f, "negctrl"),
            Token::Pi => write!(f, "pi"),
            Token::Tau => write!(f, "tau"),
            Token::Euler => write!(f, "euler"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::StringLiteral => write!(f, "string literal"),
            Token::HardwareQubit(v) => write!(f, "${v}"),
            Token::Identifier => write!(f, "identifier"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Power => write!(f, "**"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::LShift => write!(f, "<<"),
            Token::RShift => write!(f, ">>"),
            Token::Eq => write!(f, "="),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::Arrow => write!(f, "->"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its source text and span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token,
    /// Slice of the normalized source covered by this token (empty for `Eof`).
    pub text: &'src str,
    pub span: Span,
}

/// Streaming lexer over normalized source text.
///
/// Yields tokens in source order followed by exactly one [`Token::Eof`]. Lexical
/// errors are yielded as `Err` and never stop the stream.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, Token>,
    pos: Position,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over `source`, which should already be [`normalize`]d.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            pos: Position::START,
            finished: false,
        }
    }

    /// Move the tracked position to byte `offset`, returning it.
    fn seek(&mut self, offset: usize) -> Position {
        if offset > self.pos.offset {
            self.pos = self.pos.advance(&self.source[self.pos.offset..offset]);
        }
        self.pos
    }

    fn lex_error(kind: LexErrorKind, text: &str, span: Span) -> ParseError {
        let message = match kind {
            LexErrorKind::InvalidCharacter => {
                let c = text.chars().next().unwrap_or(' ');
                format!("unrecognized character '{}'", c.escape_default())
            }
            LexErrorKind::IntegerOverflow => format!("integer literal '{text}' out of range"),
            other => other.to_string(),
        };
        ParseError::lexical(message, span)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<SpannedToken<'src>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(result) => {
                let range = self.inner.span();
                let text = &self.source[range.clone()];
                let start = self.seek(range.start);
                let end = self.seek(range.end);
                let span = Span::new(start, end);

                Some(match result {
                    Ok(token) => Ok(SpannedToken { token, text, span }),
                    Err(kind) => Err(Self::lex_error(kind, text, span)),
                })
            }
            None => {
                self.finished = true;
                let end = self.seek(self.source.len());
                Some(Ok(SpannedToken {
                    token: Token::Eof,
                    text: "",
                    span: Span::point(end),
                }))
            }
        }
    }
}

/// The output of [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct TokenStream<'src> {
    /// Significant tokens, always ending with a single [`Token::Eof`].
    pub tokens: Vec<SpannedToken<'src>>,
    /// Comment tokens in source order.
    pub comments: Vec<SpannedToken<'src>>,
}

/// Drain a [`Lexer`] over `source`, recording lexical errors in `diagnostics`.
///
/// Error tokens are dropped; comments are split off from the significant tokens.
pub fn tokenize<'src>(source: &'src str, diagnostics: &mut Diagnostics) -> TokenStream<'src> {
    let mut stream = TokenStream::default();

    for result in Lexer::new(source) {
        match result {
            Ok(tok) if tok.token.is_comment() => stream.comments.push(tok),
            Ok(tok) => stream.tokens.push(tok),
            Err(err) => diagnostics.push(err),
        }
    }

    stream
}

/// Drop a leading byte-order mark, canonicalize line endings to `\n` and
/// guarantee a trailing newline.
pub fn normalize(source: &str) -> Cow<'_, str> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if !source.contains('\r') && source.ends_with('\n') {
        return Cow::Borrowed(source);
    }

    let mut text = source.replace("\r\n", "\n").replace('\r', "\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    Cow::Owned(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize(source, &mut diags);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        stream.tokens.into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = lex("OPENQASM 3.0;");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 3.0).abs() < 0.001));
        assert_eq!(tokens[2], Token::Semicolon);
        assert_eq!(tokens[3], Token::Eof);
    }

    #[test]
    fn test_qubit_declaration() {
        let tokens = lex("qubit[2] q;");
        assert_eq!(
            tokens,
            [
                Token::Qubit,
                Token::LBracket,
                Token::IntLiteral(2),
                Token::RBracket,
                Token::Identifier,
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_parameterized_gate() {
        let tokens = lex("rx(pi/2) q[0];");
        assert_eq!(tokens[0], Token::Identifier);
        assert_eq!(tokens[1], Token::LParen);
        assert_eq!(tokens[2], Token::Pi);
        assert_eq!(tokens[3], Token::Slash);
        assert_eq!(tokens[4], Token::IntLiteral(2));
        assert_eq!(tokens[5], Token::RParen);
    }

    #[test]
    fn test_float_forms() {
        for src in ["1.", "1.5", ".5", "1e3", "1.5e-3"] {
            let tokens = lex(src);
            assert!(
                matches!(tokens[0], Token::FloatLiteral(_)),
                "{src} lexed as {:?}",
                tokens[0]
            );
            assert_eq!(tokens.len(), 2, "{src}");
        }
    }

    #[test]
    fn test_keywords_beat_identifiers() {
        assert_eq!(lex("negctrl")[0], Token::NegCtrl);
        assert_eq!(lex("negctrl_x")[0], Token::Identifier);
        assert_eq!(lex("qreg")[0], Token::QReg);
    }

    #[test]
    fn test_hardware_qubit_and_strings() {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize("$12 \"a.inc\" 'b'", &mut diags);
        assert!(diags.is_empty());
        assert_eq!(stream.tokens[0].token, Token::HardwareQubit(12));
        assert_eq!(stream.tokens[1].text, "\"a.inc\"");
        assert_eq!(stream.tokens[2].text, "'b'");
    }

    #[test]
    fn test_comments_are_split_off() {
        let source = "// header\nqubit q;\n/* multi\n   line */\nbit c;\n";
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize(source, &mut diags);

        assert_eq!(stream.tokens.len(), 7);
        assert_eq!(stream.comments.len(), 2);
        assert_eq!(stream.comments[0].text, "// header");
        assert_eq!(stream.comments[1].token, Token::BlockComment);
        assert_eq!(stream.comments[1].span.start.line, 3);
        assert_eq!(stream.comments[1].span.end.line, 4);
    }

    #[test]
    fn test_positions() {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize("qubit q;\n  h q;\n", &mut diags);
        let h = &stream.tokens[3];
        assert_eq!(h.text, "h");
        assert_eq!(h.span.start, Position::new(2, 3, 11));
        assert_eq!(h.span.end, Position::new(2, 4, 12));

        let eof = stream.tokens.last().unwrap();
        assert_eq!(eof.token, Token::Eof);
        assert_eq!(eof.span.start, Position::new(3, 1, 16));
    }

    #[test]
    fn test_invalid_character_is_reported_and_skipped() {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize("h # q;", &mut diags);

        assert_eq!(diags.len(), 1);
        let err = diags.first().unwrap();
        assert_eq!(err.kind, crate::error::ErrorKind::Lexical);
        assert_eq!(err.column(), 3);
        assert!(err.message.contains('#'));

        let tokens: Vec<_> = stream.tokens.iter().map(|t| t.token).collect();
        assert_eq!(
            tokens,
            [Token::Identifier, Token::Identifier, Token::Semicolon, Token::Eof]
        );
    }

    #[test]
    fn test_unterminated_comment_consumes_rest() {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize("h q; /* never closed\nx q;\n", &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.first().unwrap().message, "unterminated block comment");
        assert_eq!(stream.tokens.len(), 4);
    }

    #[test]
    fn test_unterminated_string() {
        let mut diags = Diagnostics::unbounded();
        let stream = tokenize("include \"std.inc;\nh q;\n", &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.first().unwrap().message, "unterminated string literal");
        assert_eq!(stream.tokens[1].text, "h");
    }

    #[test]
    fn test_integer_overflow() {
        let mut diags = Diagnostics::unbounded();
        tokenize("x q[99999999999999999999999];", &mut diags);
        assert_eq!(diags.len(), 1);
        assert!(diags.first().unwrap().message.contains("out of range"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(""), "\n");
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc\n");
        assert!(matches!(normalize("ok\n"), Cow::Borrowed(_)));
        assert!(matches!(normalize("\u{feff}ok\n"), Cow::Borrowed("ok\n")));
        assert_eq!(normalize("\u{feff}a\r\n"), "a\n");
        // Only a leading mark is removed.
        assert_eq!(normalize("a\u{feff}"), "a\u{feff}\n");
    }
}
