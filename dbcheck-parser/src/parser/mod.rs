//! Parser module for DB files
//!
//! This module provides the lexer, document model, and parser for the DB
//! grammar.

pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;

pub use error::DbSyntaxError;
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use model::{Db, Field, Record};
pub use parser::{parse, Parser};
