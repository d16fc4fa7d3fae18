//! Tokenizer for value expressions.
//!
//! Lexemes are recognised with a Logos DFA; the [`Lexer`] wraps it into a
//! pull interface with a single live [`Token`] that each [`Lexer::next`] call
//! overwrites, plus a one-token [`Lexer::rewind`] for lookahead.
//!
//! Whether `/` divides or opens a `/regex/` mask depends on where the
//! parser is, so [`LexFlags`] tells the lexer which one it expects.

use chrono::NaiveDate;
use ledgerfmt_core::Amount;
use logos::Logos;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::value::Value;

/// Kind of an expression token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Lexical error; the token value holds the diagnostic.
    Error,
    /// Literal; the token value holds it.
    Value,
    /// Identifier; the token value holds its name.
    Ident,
    /// `/regex/`; the token value holds the pattern.
    Mask,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `=`
    Assign,
    /// `=~`
    Match,
    /// `!~`
    NotMatch,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `*`
    Star,
    /// `/` or `div`
    Div,
    /// `!` or `not`
    Not,
    /// `&`, `&&` or `and`
    And,
    /// `|`, `||` or `or`
    Or,
    /// `%` or `mod`
    Mod,
    /// `?`
    Query,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// End of input.
    Eof,
    /// Not yet lexed.
    Unknown,
}

/// Raw lexemes recognised by the DFA.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Lexeme<'src> {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number(&'src str),

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Quoted(&'src str),

    #[regex(r"\[[^\]]*\]")]
    Date(&'src str),

    #[regex(r"\{[^}]*\}")]
    Commodity(&'src str),

    #[regex(r"[A-Za-z_][-A-Za-z0-9_:]*")]
    Ident(&'src str),

    #[token("==", |_| TokenKind::Equal)]
    #[token("!=", |_| TokenKind::NotEqual)]
    #[token("<=", |_| TokenKind::LessEq)]
    #[token(">=", |_| TokenKind::GreaterEq)]
    #[token("=~", |_| TokenKind::Match)]
    #[token("!~", |_| TokenKind::NotMatch)]
    #[token("&&", |_| TokenKind::And)]
    #[token("||", |_| TokenKind::Or)]
    #[token("(", |_| TokenKind::LParen)]
    #[token(")", |_| TokenKind::RParen)]
    #[token("<", |_| TokenKind::Less)]
    #[token(">", |_| TokenKind::Greater)]
    #[token("=", |_| TokenKind::Assign)]
    #[token("!", |_| TokenKind::Not)]
    #[token("-", |_| TokenKind::Minus)]
    #[token("+", |_| TokenKind::Plus)]
    #[token("*", |_| TokenKind::Star)]
    #[token("/", |_| TokenKind::Div)]
    #[token("&", |_| TokenKind::And)]
    #[token("|", |_| TokenKind::Or)]
    #[token("%", |_| TokenKind::Mod)]
    #[token("?", |_| TokenKind::Query)]
    #[token(":", |_| TokenKind::Colon)]
    #[token(",", |_| TokenKind::Comma)]
    Operator(TokenKind),
}

/// Context the parser is lexing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexFlags {
    /// An operator is expected, so `/` means division rather than a mask.
    pub op_context: bool,
}

impl LexFlags {
    /// Flags for reading an operand.
    pub const OPERAND: Self = Self { op_context: false };
    /// Flags for reading an operator.
    pub const OPERATOR: Self = Self { op_context: true };
}

/// The token most recently read by a [`Lexer`].
///
/// There is exactly one live token per lexer; it is not `Clone` so that
/// nothing holds on to it across a [`Lexer::next`] call. Use
/// [`Lexer::take_value`] to move its payload out.
#[derive(Debug)]
pub struct Token {
    /// Classification.
    pub kind: TokenKind,
    /// Up to two source characters, for diagnostics.
    pub symbol: String,
    /// Literal payload for `Value`, name for `Ident`, pattern for `Mask`,
    /// diagnostic for `Error`.
    pub value: Value,
    /// Bytes consumed, leading whitespace included.
    pub length: usize,
}

impl Token {
    const fn unknown() -> Self {
        Self {
            kind: TokenKind::Unknown,
            symbol: String::new(),
            value: Value::Null,
            length: 0,
        }
    }

    fn new(kind: TokenKind, text: &str, value: Value, length: usize) -> Self {
        Self {
            kind,
            symbol: text.chars().take(2).collect(),
            value,
            length,
        }
    }

    fn error(message: impl Into<String>, text: &str, length: usize) -> Self {
        Self::new(TokenKind::Error, text, Value::String(message.into()), length)
    }

    /// The identifier name, mask pattern or error message carried by the token.
    #[must_use]
    pub fn text(&self) -> &str {
        match &self.value {
            Value::String(s) => s,
            _ => &self.symbol,
        }
    }
}

/// Pull tokenizer over an expression string.
#[derive(Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    token_start: usize,
    token: Token,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `source`.
    #[must_use]
    pub const fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            token_start: 0,
            token: Token::unknown(),
        }
    }

    /// Byte offset just past the current token.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Byte offset where the current token's text starts.
    #[must_use]
    pub const fn token_start(&self) -> usize {
        self.token_start
    }

    /// The current token.
    #[must_use]
    pub const fn token(&self) -> &Token {
        &self.token
    }

    /// Move the current token's payload out, leaving `Null` behind.
    pub fn take_value(&mut self) -> Value {
        std::mem::take(&mut self.token.value)
    }

    /// Push back the characters consumed by the current token.
    ///
    /// Only one token of lookahead exists: calling this twice without an
    /// intervening [`Lexer::next`] is a bug.
    pub fn rewind(&mut self) {
        debug_assert!(self.token.length <= self.pos, "rewind past start of input");
        self.pos -= self.token.length;
        self.token.length = 0;
    }

    /// Read the next token, replacing the current one.
    pub fn next(&mut self, flags: LexFlags) -> &Token {
        let rest = &self.source[self.pos..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();
        self.token_start = self.pos + skipped;

        self.token = if trimmed.is_empty() {
            Token::new(TokenKind::Eof, "", Value::Null, skipped)
        } else if !flags.op_context && trimmed.starts_with('/') {
            scan_mask(trimmed, skipped)
        } else {
            scan(trimmed, skipped)
        };
        self.pos += self.token.length;
        &self.token
    }
}

fn scan(input: &str, skipped: usize) -> Token {
    let mut lexer = Lexeme::lexer(input);
    let Some(result) = lexer.next() else {
        return Token::new(TokenKind::Eof, "", Value::Null, skipped + input.len());
    };
    let span = lexer.span();
    let text = &input[span.clone()];
    let length = skipped + span.end;

    let Ok(lexeme) = result else {
        return Token::error(diagnose(input), text, length);
    };

    match lexeme {
        Lexeme::Operator(kind) => Token::new(kind, text, Value::Null, length),
        Lexeme::Number(digits) => match Decimal::from_str(digits) {
            Ok(n) => Token::new(TokenKind::Value, text, Value::Amount(Amount::bare(n)), length),
            Err(_) => Token::error(format!("invalid number '{digits}'"), text, length),
        },
        Lexeme::Quoted(quoted) => {
            let inner = &quoted[1..quoted.len() - 1];
            Token::new(TokenKind::Value, text, Value::from(inner), length)
        }
        Lexeme::Date(bracketed) => {
            let inner = bracketed[1..bracketed.len() - 1].trim();
            match parse_date(inner) {
                Some(date) => Token::new(TokenKind::Value, text, Value::Date(date), length),
                None => Token::error(format!("invalid date '{inner}'"), text, length),
            }
        }
        Lexeme::Commodity(braced) => {
            let inner = &braced[1..braced.len() - 1];
            match inner.parse::<Amount>() {
                Ok(amount) => Token::new(TokenKind::Value, text, Value::Amount(amount), length),
                Err(err) => Token::error(err.to_string(), text, length),
            }
        }
        Lexeme::Ident(name) => {
            let kind = match name.to_ascii_lowercase().as_str() {
                "and" => TokenKind::And,
                "or" => TokenKind::Or,
                "not" => TokenKind::Not,
                "div" => TokenKind::Div,
                "mod" => TokenKind::Mod,
                "true" => return Token::new(TokenKind::Value, text, Value::Bool(true), length),
                "false" => return Token::new(TokenKind::Value, text, Value::Bool(false), length),
                _ => return Token::new(TokenKind::Ident, text, Value::from(name), length),
            };
            Token::new(kind, text, Value::Null, length)
        }
    }
}

/// Read `/pattern/`, where `\/` stands for a literal slash.
fn scan_mask(input: &str, skipped: usize) -> Token {
    let body = &input[1..];
    let mut pattern = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '/' => {
                let length = skipped + 1 + i + 1;
                return Token::new(TokenKind::Mask, input, Value::String(pattern), length);
            }
            '\\' => match chars.next() {
                Some((_, '/')) => pattern.push('/'),
                Some((_, other)) => {
                    pattern.push('\\');
                    pattern.push(other);
                }
                None => pattern.push('\\'),
            },
            _ => pattern.push(c),
        }
    }
    Token::error("missing closing '/' in mask", input, skipped + input.len())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    ["%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn diagnose(input: &str) -> String {
    match input.chars().next() {
        Some('"' | '\'') => "unterminated string literal".to_string(),
        Some('[') => "missing ']' in date literal".to_string(),
        Some('{') => "missing '}' in amount literal".to_string(),
        Some(c) => format!("unexpected character '{c}'"),
        None => "unexpected end of input".to_string(),
    }
}
