//! Syntax error raised by the lexer and parser

use thiserror::Error;

/// A grammar violation. Fatal for the file being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DbSyntaxError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl DbSyntaxError {
    pub fn new(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
        }
    }
}
