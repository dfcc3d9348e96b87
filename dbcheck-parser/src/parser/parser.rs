//! DB file parser
//!
//! Recursive descent parser that converts tokens into a [`Db`]. Holds exactly
//! one lookahead token and never backtracks.

use crate::parser::error::DbSyntaxError;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::model::{Db, Field, Record};

type ParseResult<T> = Result<T, DbSyntaxError>;

/// Parser state
pub struct Parser<I> {
    tokens: I,
    current: Token,
}

impl<'src> Parser<Lexer<'src>> {
    /// Create a new parser over source text
    pub fn from_source(source: &'src str) -> ParseResult<Self> {
        Self::new(Lexer::new(source))
    }
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token, DbSyntaxError>>,
{
    /// Create a parser from any token source, pulling the first lookahead token
    pub fn new(mut tokens: I) -> ParseResult<Self> {
        let current = match tokens.next() {
            Some(token) => token?,
            None => return Err(DbSyntaxError::new("No tokens found.", 0, 0)),
        };
        Ok(Self { tokens, current })
    }

    /// Parse a whole file
    pub fn parse_db(&mut self) -> ParseResult<Db> {
        let mut db = Db::default();

        while !self.check(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::Record => {
                    let record = self.parse_record()?;
                    db.records.push(record);
                }
                TokenKind::Hash => self.skip_comment()?,
                TokenKind::Alias => {
                    let (parent, alias) = self.parse_alias()?;
                    // The parent may live in another file
                    if !db.attach_alias(&parent, alias.as_str()) {
                        tracing::debug!("Alias '{}' refers to unknown record '{}'", alias, parent);
                    }
                }
                kind if kind.is_macro_start() => self.skip_macro()?,
                _ => return Err(self.error("Expected record or alias")),
            }
        }

        Ok(db)
    }

    // ========================================
    // Records
    // ========================================

    fn parse_record(&mut self) -> ParseResult<Record> {
        self.expect(TokenKind::Record)?;
        let (record_type, name) = self.parse_key_value_pair()?;
        let mut record = Record::new(record_type, name);

        loop {
            if self.current.kind.is_macro_start() {
                self.skip_macro()?;
            } else if self.check(TokenKind::Hash) {
                self.skip_comment()?;
            } else {
                break;
            }
        }

        // Records declared without a body are completed elsewhere
        if !self.check(TokenKind::LBrace) {
            return Ok(record);
        }

        self.expect(TokenKind::LBrace)?;
        let mut after_macro = false;

        while !self.check(TokenKind::RBrace) {
            match self.current.kind {
                kind if kind.is_macro_start() => {
                    self.skip_macro()?;
                    after_macro = true;
                    continue;
                }
                TokenKind::Field => {
                    let field = self.parse_field(after_macro)?;
                    record.fields.push(field);
                }
                TokenKind::Info => {
                    let info = self.parse_info()?;
                    record.infos.push(info);
                }
                TokenKind::Alias => {
                    let alias = self.parse_body_alias()?;
                    record.aliases.push(alias);
                }
                TokenKind::Hash => self.skip_comment()?,
                _ => return Err(self.error("Expected info, field or alias")),
            }
            after_macro = false;
        }

        self.expect(TokenKind::RBrace)?;
        Ok(record)
    }

    fn parse_field(&mut self, has_macro: bool) -> ParseResult<Field> {
        self.expect(TokenKind::Field)?;
        let (name, value) = self.parse_key_value_pair()?;
        Ok(Field::new(name, value).with_macro(has_macro))
    }

    fn parse_info(&mut self) -> ParseResult<Field> {
        self.expect(TokenKind::Info)?;
        let (name, value) = self.parse_key_value_pair()?;
        Ok(Field::new(name, value))
    }

    /// `alias("NAME")` inside a record body
    fn parse_body_alias(&mut self) -> ParseResult<String> {
        self.expect(TokenKind::Alias)?;
        self.expect(TokenKind::LBracket)?;
        let alias = self.parse_value()?;
        self.expect(TokenKind::RBracket)?;
        Ok(alias)
    }

    /// `alias("PARENT", "CHILD")` at the top level
    fn parse_alias(&mut self) -> ParseResult<(String, String)> {
        self.expect(TokenKind::Alias)?;
        self.parse_key_value_pair()
    }

    // ========================================
    // Values
    // ========================================

    fn parse_key_value_pair(&mut self) -> ParseResult<(String, String)> {
        self.expect(TokenKind::LBracket)?;
        let key = self.parse_value()?;
        self.expect(TokenKind::Comma)?;
        let value = self.parse_value()?;
        self.expect(TokenKind::RBracket)?;
        Ok((key, value))
    }

    /// A quoted string (quotes stripped) or a run of literals and macros
    fn parse_value(&mut self) -> ParseResult<String> {
        if self.check(TokenKind::QuotedString) {
            let quoted = self.expect(TokenKind::QuotedString)?;
            return Ok(strip_quotes(&quoted).to_string());
        }

        if !self.check(TokenKind::Literal) && !self.current.kind.is_macro_start() {
            return Err(self.error("Expected either a literal or a string literal."));
        }

        let mut value = String::new();
        loop {
            if self.check(TokenKind::Literal) {
                value.push_str(&self.expect(TokenKind::Literal)?);
            } else if self.current.kind.is_macro_start() {
                self.skip_macro()?;
            } else {
                break;
            }
        }
        Ok(value)
    }

    /// Consume a `$(NAME=DEFAULT)` or `${NAME=DEFAULT}` expansion. Macros are
    /// not resolved and contribute no text.
    fn skip_macro(&mut self) -> ParseResult<()> {
        let close = match self.current.kind {
            TokenKind::BracketMacroStart => TokenKind::RBracket,
            TokenKind::BraceMacroStart => TokenKind::RBrace,
            _ => return Err(self.error("Expected start of macro")),
        };
        self.advance()?;

        while !self.check(close) && !self.check(TokenKind::Equals) {
            if self.check(TokenKind::Literal) {
                self.advance()?;
            } else if self.current.kind.is_macro_start() {
                self.skip_macro()?;
            } else {
                return Err(self.error("Expected macro or literal"));
            }
        }

        if self.check(TokenKind::Equals) {
            self.advance()?;
            while !self.check(close) {
                match self.current.kind {
                    // `#` is a legitimate default value here, not a comment
                    TokenKind::Literal | TokenKind::Hash => {
                        self.advance()?;
                    }
                    kind if kind.is_macro_start() => self.skip_macro()?,
                    _ => return Err(self.error("Expected macro or literal")),
                }
            }
        }

        self.expect(close)?;
        Ok(())
    }

    /// Consume a `#` and everything after it on the same line
    fn skip_comment(&mut self) -> ParseResult<()> {
        let line = self.current.line;
        self.expect(TokenKind::Hash)?;

        while self.current.line == line && !self.check(TokenKind::Eof) {
            self.advance()?;
        }
        Ok(())
    }

    // ========================================
    // Token utilities
    // ========================================

    fn advance(&mut self) -> ParseResult<Token> {
        match self.tokens.next() {
            Some(next) => Ok(std::mem::replace(&mut self.current, next?)),
            None => Err(self.error("Next token was requested, but none exists.")),
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume a token of `kind`, returning its text
    fn expect(&mut self, kind: TokenKind) -> ParseResult<String> {
        if self.check(kind) {
            Ok(self.advance()?.text)
        } else {
            Err(self.error(format!("Expected '{}'.", kind)))
        }
    }

    fn error(&self, message: impl AsRef<str>) -> DbSyntaxError {
        DbSyntaxError::new(
            format!(
                "Unexpected token '{}' encountered at {}:{}: {}",
                self.current,
                self.current.line,
                self.current.column,
                message.as_ref()
            ),
            self.current.line,
            self.current.column,
        )
    }
}

fn strip_quotes(quoted: &str) -> &str {
    quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted)
}

/// Parse DB file text into a [`Db`]
pub fn parse(source: &str) -> ParseResult<Db> {
    let mut parser = Parser::from_source(source)?;
    parser.parse_db()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Token source that replays a fixed sequence
    fn mock(kinds: &[(TokenKind, &str)]) -> impl Iterator<Item = Result<Token, DbSyntaxError>> {
        let tokens: Vec<_> = kinds
            .iter()
            .enumerate()
            .map(|(i, (kind, text))| Ok(Token::new(*kind, 1, i, *text)))
            .collect();
        tokens.into_iter()
    }

    #[test]
    fn test_no_tokens() {
        let err = Parser::new(std::iter::empty::<Result<Token, DbSyntaxError>>()).err().unwrap();
        assert_eq!(err.message, "No tokens found.");
    }

    #[test]
    fn test_only_eof() {
        let db = Parser::new(mock(&[(TokenKind::Eof, "")])).unwrap().parse_db().unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\n   \n").unwrap().is_empty());
    }

    #[test]
    fn test_value_quoted_and_literal() {
        let mut parser = Parser::new(mock(&[
            (TokenKind::QuotedString, "\"HELLO\""),
            (TokenKind::Eof, ""),
        ]))
        .unwrap();
        assert_eq!(parser.parse_value().unwrap(), "HELLO");

        let mut parser =
            Parser::new(mock(&[(TokenKind::Literal, "HELLO"), (TokenKind::Eof, "")])).unwrap();
        assert_eq!(parser.parse_value().unwrap(), "HELLO");
    }

    #[test]
    fn test_value_rejects_other_tokens() {
        let mut parser =
            Parser::new(mock(&[(TokenKind::Comma, ","), (TokenKind::Eof, "")])).unwrap();
        assert!(parser.parse_value().is_err());
    }

    #[test]
    fn test_value_reassembles_around_macro() {
        let db = parse(r#"record(ai, $(P)TEMP$(Q=x)_1) {}"#).unwrap();
        assert_eq!(db.records[0].name, "TEMP_1");
    }

    #[test]
    fn test_key_value_pair_missing_comma() {
        let err = parse(r#"record(ai "TEMP") {}"#).unwrap_err();
        assert!(err.message.contains("Expected 'COMMA'"));
        assert_eq!((err.line, err.col), (1, 10));
    }

    #[test]
    fn test_empty_record() {
        let db = parse(r#"record(ai, "$(P)TEMP") {}"#).unwrap();
        assert_eq!(db.len(), 1);
        let record = &db.records[0];
        assert_eq!(record.record_type, "ai");
        assert_eq!(record.name, "$(P)TEMP");
        assert!(record.fields.is_empty());
        assert!(record.infos.is_empty());
        assert!(record.aliases.is_empty());
    }

    #[test]
    fn test_record_with_field_info_and_alias() {
        let db = parse(
            r#"
            grecord(ao, "$(P)TEMP:SP") {
                field(DESC, "Setpoint")
                field(EGU, K)
                info(INTEREST, "HIGH")
                alias("$(P)TEMP:SETPOINT")
            }
            "#,
        )
        .unwrap();

        let record = &db.records[0];
        assert_eq!(record.record_type, "ao");
        assert_eq!(
            record.fields,
            vec![Field::new("DESC", "Setpoint"), Field::new("EGU", "K")]
        );
        assert_eq!(record.infos, vec![Field::new("INTEREST", "HIGH")]);
        assert_eq!(record.aliases, vec!["$(P)TEMP:SETPOINT"]);
    }

    #[test]
    fn test_duplicate_fields_survive() {
        let db = parse(
            r#"record(ai, "A") { field(DESC, "a") field(DESC, "b") }"#,
        )
        .unwrap();
        assert_eq!(db.records[0].field_names(), vec!["DESC", "DESC"]);
    }

    #[test]
    fn test_records_without_bodies() {
        let db = parse("record(ai, \"A\")\nrecord(bo, \"B\")\n").unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(db.records[0].name, "A");
        assert_eq!(db.records[1].record_type, "bo");
    }

    #[test]
    fn test_detached_alias_attaches_to_parent() {
        let db = parse(
            r#"
            record(ai, "PARENT") {}
            alias("PARENT", "CHILD")
            alias("CHILD", "GRANDCHILD")
            "#,
        )
        .unwrap();
        assert_eq!(db.len(), 1);
        assert_eq!(db.records[0].aliases, vec!["CHILD", "GRANDCHILD"]);
    }

    #[test]
    fn test_detached_alias_without_parent_is_ignored() {
        let db = parse(
            r#"
            alias("ELSEWHERE", "CHILD")
            record(ai, "PARENT") {}
            "#,
        )
        .unwrap();
        assert!(db.records[0].aliases.is_empty());
    }

    #[test]
    fn test_has_macro_flag() {
        let db = parse(
            r#"
            record(ai, "A") {
                $(IFSIM=#) field(SIML, "X")
                field(DESC, "Y")
            }
            "#,
        )
        .unwrap();
        let fields = &db.records[0].fields;
        assert!(fields[0].has_macro);
        assert!(!fields[1].has_macro);
    }

    #[test]
    fn test_nested_macro_with_hash_default() {
        let db = parse(
            r#"
            $(A=$(B=#))
            record(ai, "${P=$(Q)}X") {
                ${IFX=$(Y=#)} field(DESC, "Z")
            }
            "#,
        )
        .unwrap();
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn test_mismatched_macro_close() {
        let err = parse("$(A=B}").unwrap_err();
        assert!(err.message.contains("Expected macro or literal"));
    }

    #[test]
    fn test_comments() {
        let db = parse(
            r#"
            # header comment, with ( unbalanced { tokens
            record(ai, "A") # trailing comment
            {
                # field(DESC, "ignored")
                field(DESC, "kept # not a comment")
            }
            # last line without newline"#,
        )
        .unwrap();
        let record = &db.records[0];
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.field_value("DESC"), Some("kept # not a comment"));
    }

    #[test]
    fn test_unexpected_top_level_token() {
        let err = parse(r#"field(DESC, "x")"#).unwrap_err();
        assert!(err.message.contains("Expected record or alias"));
        assert_eq!((err.line, err.col), (1, 0));
    }

    #[test]
    fn test_unterminated_body() {
        let err = parse("record(ai, \"A\") {\n field(DESC, \"x\")\n").unwrap_err();
        assert!(err.message.contains("Expected info, field or alias"));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_json_structured_value_is_rejected() {
        assert!(parse(r#"record(ai, "A") { field(INP, {pva: "x"}) }"#).is_err());
    }
}
