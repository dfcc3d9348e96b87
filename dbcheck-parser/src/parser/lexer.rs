//! Lexer for EPICS DB files
//!
//! Tokenizes the record/field/info/alias grammar, including the `$(...)` and
//! `${...}` macro sublanguage.
//!
//! Key features:
//! - Keywords (`record`, `grecord`, `field`, `info`, `alias`) win over the
//!   generic literal rule only when they are the whole word
//! - `#` is its own token; whether it starts a comment is decided by the parser
//! - Anything no other rule accepts becomes an `Unknown` token, so no input is
//!   silently dropped
//! - Whitespace is lexed but never handed to consumers

use crate::parser::error::DbSyntaxError;
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Record,
    Field,
    Info,
    Alias,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Equals,
    QuotedString,
    Literal,
    Hash,
    BraceMacroStart,
    BracketMacroStart,
    Whitespace,
    Unknown,
    Eof,
}

impl TokenKind {
    pub fn is_macro_start(self) -> bool {
        matches!(self, TokenKind::BraceMacroStart | TokenKind::BracketMacroStart)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Record => "RECORD",
            TokenKind::Field => "FIELD",
            TokenKind::Info => "INFO",
            TokenKind::Alias => "ALIAS",
            TokenKind::LBracket => "L_BRACKET",
            TokenKind::RBracket => "R_BRACKET",
            TokenKind::LBrace => "L_BRACE",
            TokenKind::RBrace => "R_BRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Equals => "EQUALS",
            TokenKind::QuotedString => "QUOTED_STRING",
            TokenKind::Literal => "LITERAL",
            TokenKind::Hash => "HASH",
            TokenKind::BraceMacroStart => "BRACE_MACRO_START",
            TokenKind::BracketMacroStart => "BRACKET_MACRO_START",
            TokenKind::Whitespace => "WHITESPACE",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::Eof => "EOF",
        };
        f.write_str(name)
    }
}

/// A token with its position in the source.
///
/// Lines are 1-based, columns are 0-based character offsets into the line.
/// Two tokens compare equal when their kinds match; content and position are
/// ignored.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize, text: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            text: text.into(),
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl From<TokenKind> for Token {
    fn from(kind: TokenKind) -> Self {
        Token::new(kind, 0, 0, "")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (contents={})", self.kind, self.text)
    }
}

/// Raw token rules handed to logos
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum Lexeme {
    #[token("$(")]
    BracketMacroStart,

    #[token("${")]
    BraceMacroStart,

    #[token("record")]
    #[token("grecord")]
    Record,

    #[token("field")]
    Field,

    #[token("info")]
    Info,

    #[token("alias")]
    Alias,

    #[token("(")]
    LBracket,

    #[token(")")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token("=")]
    Equals,

    /// "..." on a single line, escaped quotes allowed, `""` included
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    QuotedString,

    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    /// Alphanumerics plus `-`, `_`, `.` and `:`
    #[regex(r"[a-zA-Z0-9_.:\-]+")]
    Literal,

    /// Mostly comments, but `$(MACRO=#)` is legal too
    #[token("#")]
    Hash,

    /// Any single character no other rule can start with
    #[regex(r##"[^ \t\r\n\x0Ca-zA-Z0-9_.:\-(){},="#$]"##)]
    Unknown,
}

impl From<Lexeme> for TokenKind {
    fn from(lexeme: Lexeme) -> Self {
        match lexeme {
            Lexeme::BracketMacroStart => TokenKind::BracketMacroStart,
            Lexeme::BraceMacroStart => TokenKind::BraceMacroStart,
            Lexeme::Record => TokenKind::Record,
            Lexeme::Field => TokenKind::Field,
            Lexeme::Info => TokenKind::Info,
            Lexeme::Alias => TokenKind::Alias,
            Lexeme::LBracket => TokenKind::LBracket,
            Lexeme::RBracket => TokenKind::RBracket,
            Lexeme::LBrace => TokenKind::LBrace,
            Lexeme::RBrace => TokenKind::RBrace,
            Lexeme::Comma => TokenKind::Comma,
            Lexeme::Equals => TokenKind::Equals,
            Lexeme::QuotedString => TokenKind::QuotedString,
            Lexeme::Whitespace => TokenKind::Whitespace,
            Lexeme::Literal => TokenKind::Literal,
            Lexeme::Hash => TokenKind::Hash,
            Lexeme::Unknown => TokenKind::Unknown,
        }
    }
}

/// Pull-style token stream over one file's text.
///
/// Yields every non-whitespace token in source order, then exactly one
/// `Eof` token, then `None`.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, Lexeme>,
    line: usize,
    line_start: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: Lexeme::lexer(source),
            line: 1,
            line_start: 0,
            finished: false,
        }
    }

    fn column_of(&self, offset: usize) -> usize {
        self.source[self.line_start..offset].chars().count()
    }

    fn track_newlines(&mut self, span: Range<usize>) {
        let start = span.start;
        for (i, byte) in self.source.as_bytes()[span].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = start + i + 1;
            }
        }
    }

    /// Next token including whitespace; `None` once the input is exhausted
    fn next_raw(&mut self) -> Option<Result<Token, DbSyntaxError>> {
        let lexeme = self.inner.next()?;
        let span = self.inner.span();
        let line = self.line;
        let column = self.column_of(span.start);

        let kind = match lexeme {
            Ok(lexeme) => TokenKind::from(lexeme),
            // Partial matches (a lone `$`, an unterminated quote) fall back to
            // the catch-all
            Err(()) if !span.is_empty() => TokenKind::Unknown,
            Err(()) => {
                return Some(Err(DbSyntaxError::new(
                    format!(
                        "No matching rules found at {}:{}. Line contents: '{}'",
                        line,
                        column,
                        self.current_line()
                    ),
                    line,
                    column,
                )));
            }
        };

        let token = Token::new(kind, line, column, self.inner.slice());
        self.track_newlines(span);
        Some(Ok(token))
    }

    fn current_line(&self) -> &'src str {
        let rest = &self.source[self.line_start..];
        rest.split('\n').next().unwrap_or(rest)
    }

    fn eof_token(&self) -> Token {
        let column = self.column_of(self.source.len());
        Token::new(TokenKind::Eof, self.line, column, "")
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, DbSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.next_raw() {
                Some(Ok(token)) if token.kind == TokenKind::Whitespace => continue,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                Some(token) => return Some(token),
                None => {
                    self.finished = true;
                    return Some(Ok(self.eof_token()));
                }
            }
        }
    }
}

/// Tokenize a whole file eagerly
pub fn tokenize(source: &str) -> Result<Vec<Token>, DbSyntaxError> {
    Lexer::new(source).collect()
}
