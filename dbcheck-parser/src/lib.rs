//! DB File Parser
//!
//! This crate turns EPICS DB file text into a typed document model. Macros
//! (`$(P)`, `${P=default}`) are consumed structurally but left unexpanded.
//!
//! # Example
//!
//! ```rust
//! use dbcheck_parser::parse;
//!
//! let source = r#"
//!     record(ai, "$(P)TEMP") {
//!         field(DESC, "Temperature")
//!         field(EGU, "K")
//!         info(INTEREST, "HIGH")
//!     }
//!     alias("$(P)TEMP", "$(P)TEMPERATURE")
//! "#;
//!
//! let db = parse(source).unwrap();
//! assert_eq!(db.len(), 1);
//! assert_eq!(db.records[0].aliases, vec!["$(P)TEMPERATURE"]);
//! ```

pub mod parser;

pub use parser::{
    parse, tokenize,
    Db, DbSyntaxError, Field, Lexer, Parser, Record, Token, TokenKind,
};
