//! Tokenizer: raw Internet Object text to an ordered token stream.
//!
//! The tokenizer makes a single forward pass over the input and never
//! backtracks. It tracks row, column and byte offset for every token, and
//! performs no semantic validation beyond decoding literal payloads.
//!
//! ## Recognized lexemes
//!
//! - punctuation `{ } [ ] : , ~` and the section separator `---`
//! - quoted strings `"…"` / `'…'` with backslash escapes, raw strings `r"…"`
//! - annotated literals `b64"…"`, `d"…"`, `t"…"`, `dt"…"`
//! - open (unquoted) strings, classified as booleans (`T`, `F`, `true`,
//!   `false`), null (`N`, `null`), numbers (with `m` decimal and `n` bigint
//!   suffixes, hex/octal/binary forms, `Inf`, `NaN`), `@variable` and
//!   `$schema` references, or plain strings
//! - `#` comments to end of line
//!
//! An annotation prefix only opens a literal when the payload starts like
//! one: `d'2024` opens a date, `d'Artagnan` is an open string.
//!
//! The only fatal lexical error is an unterminated string or annotated
//! literal. A literal whose payload does not decode (say `d"2024-13-40"`)
//! becomes a [`TokenKind::Invalid`] token so the parser can recover from it.
//!
//! ```rust
//! use internet_object::tokenizer::tokenize;
//! use internet_object::token::TokenKind;
//!
//! let tokens = tokenize("~ 1.50m, 10n, T").unwrap();
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Tilde,
//!         TokenKind::Decimal,
//!         TokenKind::Comma,
//!         TokenKind::BigInt,
//!         TokenKind::Comma,
//!         TokenKind::Boolean,
//!     ]
//! );
//! ```

use crate::error_range;
use crate::position::Position;
use crate::token::{Token, TokenKind};
use crate::value::{Number, Value};
use crate::{Error, ErrorCode, Result};
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

static DECIMAL_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d+)?|\.\d+)([eE][+-]?\d+)?$").expect("valid number pattern")
});

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

/// Prefix of an annotated literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Annotation {
    Raw,
    Base64,
    Date,
    Time,
    DateTime,
}

impl Annotation {
    const fn prefix_len(self) -> usize {
        match self {
            Annotation::Base64 => 3,
            Annotation::DateTime => 2,
            Annotation::Raw | Annotation::Date | Annotation::Time => 1,
        }
    }
}

/// Returns the annotation when `s` starts with an annotated literal opener
/// such as `dt"` or `r'`.
pub(crate) fn annotation_prefix(s: &str) -> Option<Annotation> {
    let candidates = [
        ("b64", Annotation::Base64),
        ("dt", Annotation::DateTime),
        ("d", Annotation::Date),
        ("t", Annotation::Time),
        ("r", Annotation::Raw),
    ];
    candidates.iter().find_map(|(prefix, annotation)| {
        let rest = s.strip_prefix(prefix)?;
        if rest.starts_with('"') || rest.starts_with('\'') {
            Some(*annotation)
        } else {
            None
        }
    })
}

/// Like [`annotation_prefix`], but only when the first payload character
/// fits the literal, so `d'Artagnan` and `t'Challa` stay open strings.
fn annotated_literal(s: &str) -> Option<Annotation> {
    let annotation = annotation_prefix(s)?;
    let mut body = s[annotation.prefix_len()..].chars();
    let quote = body.next()?;
    let first = body.next();
    let fits = match annotation {
        Annotation::Raw => true,
        Annotation::Base64 => first.map_or(true, |c| {
            c == quote || c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
        }),
        Annotation::Date | Annotation::Time | Annotation::DateTime => {
            first.map_or(true, |c| c == quote || c.is_ascii_digit() || c.is_whitespace())
        }
    };
    fits.then_some(annotation)
}

/// Tokenizes `input` in one pass.
///
/// # Errors
///
/// Returns a `stringNotClosed` syntax error when a quoted string or annotated
/// literal is not terminated. Its range runs from the opening delimiter to
/// the end of input.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).tokenize()
}

/// Single-pass tokenizer over a string slice.
pub struct Tokenizer<'a> {
    input: &'a str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Consumes the tokenizer and returns every token in source order.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        tracing::debug!(tokens = tokens.len(), bytes = self.input.len(), "tokenized input");
        Ok(tokens)
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.column, self.position)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.position += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.next_char();
            } else if ch == '#' {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.next_char();
                }
            } else {
                break;
            }
        }
    }

    fn make(&self, kind: TokenKind, start: Position, end: Position, value: Option<Value>) -> Token {
        Token {
            kind,
            raw: self.input[start.pos..end.pos].to_string(),
            value,
            range: error_range::between(start, end),
        }
    }

    fn punct(&mut self, kind: TokenKind) -> Token {
        let start = self.here();
        self.next_char();
        self.make(kind, start, self.here(), None)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments();
        let Some(ch) = self.peek_char() else {
            return Ok(None);
        };

        let token = match ch {
            '{' => self.punct(TokenKind::CurlyOpen),
            '}' => self.punct(TokenKind::CurlyClose),
            '[' => self.punct(TokenKind::BracketOpen),
            ']' => self.punct(TokenKind::BracketClose),
            ':' => self.punct(TokenKind::Colon),
            ',' => self.punct(TokenKind::Comma),
            '~' => self.punct(TokenKind::Tilde),
            '-' if self.rest().starts_with("---") => self.read_section_separator(),
            '"' | '\'' => self.read_quoted_string()?,
            _ => match annotated_literal(self.rest()) {
                Some(annotation) => self.read_annotated(annotation)?,
                None => self.read_open_scalar(),
            },
        };
        Ok(Some(token))
    }

    fn read_section_separator(&mut self) -> Token {
        let start = self.here();
        while self.peek_char() == Some('-') {
            self.next_char();
        }
        self.make(TokenKind::SectionSep, start, self.here(), None)
    }

    /// Reads the body of a quoted string after its opener has been consumed.
    /// `escapes` enables backslash escapes; without them a doubled quote
    /// stands for one quote.
    fn read_quoted_body(&mut self, opener: Position, quote: char, escapes: bool) -> Result<String> {
        let mut result = String::new();
        loop {
            let Some(ch) = self.next_char() else {
                return Err(Error::syntax(
                    ErrorCode::StringNotClosed,
                    "string is not closed",
                    error_range::between(opener, self.here()),
                ));
            };
            match ch {
                c if c == quote => {
                    if !escapes && self.peek_char() == Some(quote) {
                        self.next_char();
                        result.push(quote);
                    } else {
                        return Ok(result);
                    }
                }
                '\\' if escapes => match self.peek_char() {
                    Some(esc @ ('"' | '\'' | '\\' | '/')) => {
                        self.next_char();
                        result.push(esc);
                    }
                    Some('n') => {
                        self.next_char();
                        result.push('\n');
                    }
                    Some('r') => {
                        self.next_char();
                        result.push('\r');
                    }
                    Some('t') => {
                        self.next_char();
                        result.push('\t');
                    }
                    Some('b') => {
                        self.next_char();
                        result.push('\u{0008}');
                    }
                    Some('f') => {
                        self.next_char();
                        result.push('\u{000C}');
                    }
                    Some('u') => {
                        let decoded = self
                            .rest()
                            .get(1..5)
                            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
                            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                            .and_then(char::from_u32);
                        match decoded {
                            Some(c) => {
                                for _ in 0..5 {
                                    self.next_char();
                                }
                                result.push(c);
                            }
                            // Malformed escapes are kept literally.
                            None => result.push('\\'),
                        }
                    }
                    _ => result.push('\\'),
                },
                other => result.push(other),
            }
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let start = self.here();
        let quote = self.next_char().unwrap_or('"');
        let text = self.read_quoted_body(start, quote, true)?;
        Ok(self.make(TokenKind::String, start, self.here(), Some(Value::String(text))))
    }

    fn read_annotated(&mut self, annotation: Annotation) -> Result<Token> {
        let start = self.here();
        for _ in 0..annotation.prefix_len() {
            self.next_char();
        }
        let quote = self.next_char().unwrap_or('"');
        let body = self.read_quoted_body(start, quote, false)?;
        let end = self.here();

        let (kind, value) = match annotation {
            Annotation::Raw => (TokenKind::String, Some(Value::String(body))),
            Annotation::Date => decoded(TokenKind::Date, ErrorCode::InvalidDate, parse_date(&body).map(Value::Date)),
            Annotation::Time => decoded(TokenKind::Time, ErrorCode::InvalidTime, parse_time(&body).map(Value::Time)),
            Annotation::DateTime => decoded(
                TokenKind::DateTime,
                ErrorCode::InvalidDateTime,
                parse_datetime(&body).map(Value::DateTime),
            ),
            Annotation::Base64 => decoded(
                TokenKind::Binary,
                ErrorCode::InvalidBase64,
                decode_base64(&body).map(Value::Binary),
            ),
        };
        Ok(self.make(kind, start, end, value))
    }

    fn read_open_scalar(&mut self) -> Token {
        let start = self.here();
        let mut end = start;
        while let Some(ch) = self.peek_char() {
            if matches!(ch, ',' | ':' | '{' | '}' | '[' | ']' | '~' | '#' | '\n') {
                break;
            }
            self.next_char();
            if !ch.is_whitespace() {
                end = self.here();
            }
        }
        let (kind, value) = classify(&self.input[start.pos..end.pos]);
        self.make(kind, start, end, value)
    }
}

fn decoded(kind: TokenKind, code: ErrorCode, value: Option<Value>) -> (TokenKind, Option<Value>) {
    match value {
        Some(v) => (kind, Some(v)),
        None => (TokenKind::Invalid(code), None),
    }
}

/// Classifies the trimmed text of an open scalar.
fn classify(text: &str) -> (TokenKind, Option<Value>) {
    match text {
        "T" | "true" => return (TokenKind::Boolean, Some(Value::Bool(true))),
        "F" | "false" => return (TokenKind::Boolean, Some(Value::Bool(false))),
        "N" | "null" => return (TokenKind::Null, Some(Value::Null)),
        "Inf" | "+Inf" => return (TokenKind::Number, Some(Value::Number(Number::Infinity))),
        "-Inf" => {
            return (
                TokenKind::Number,
                Some(Value::Number(Number::NegativeInfinity)),
            )
        }
        "NaN" => return (TokenKind::Number, Some(Value::Number(Number::NaN))),
        _ => {}
    }

    if let Some(name) = text.strip_prefix('@') {
        if IDENTIFIER.is_match(name) {
            return (TokenKind::Variable, Some(Value::String(text.to_string())));
        }
    }
    if let Some(name) = text.strip_prefix('$') {
        if IDENTIFIER.is_match(name) {
            return (TokenKind::SchemaRef, Some(Value::String(text.to_string())));
        }
    }

    classify_number(text)
        .unwrap_or_else(|| (TokenKind::String, Some(Value::String(text.to_string()))))
}

/// Returns `None` when `text` is not shaped like a number at all, so it
/// falls back to being a string.
fn classify_number(text: &str) -> Option<(TokenKind, Option<Value>)> {
    let (body, suffix) = match text.as_bytes().last() {
        Some(b'm') => (&text[..text.len() - 1], Some('m')),
        Some(b'n') => (&text[..text.len() - 1], Some('n')),
        _ => (text, None),
    };

    let (negative, unsigned) = match body.as_bytes().first() {
        Some(b'-') => (true, &body[1..]),
        Some(b'+') => (false, &body[1..]),
        _ => (false, body),
    };

    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|&(prefix, radix)| {
            unsigned
                .strip_prefix(prefix)
                .filter(|digits| !digits.is_empty())
                .map(|digits| (radix, digits))
        });

    if let Some((radix, digits)) = radix {
        if !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        return Some(match suffix {
            Some('n') => match BigInt::parse_bytes(digits.as_bytes(), radix) {
                Some(bi) => (
                    TokenKind::BigInt,
                    Some(Value::BigInt(if negative { -bi } else { bi })),
                ),
                None => (TokenKind::Invalid(ErrorCode::InvalidBigInt), None),
            },
            Some(_) => (TokenKind::Invalid(ErrorCode::InvalidDecimal), None),
            None => match i64::from_str_radix(digits, radix) {
                Ok(n) => (
                    TokenKind::Number,
                    Some(Value::Number(Number::Integer(if negative { -n } else { n }))),
                ),
                Err(_) => (TokenKind::Invalid(ErrorCode::InvalidNumber), None),
            },
        });
    }

    if !DECIMAL_NUMBER.is_match(body) {
        return None;
    }
    let integral = !body.contains(['.', 'e', 'E']);

    Some(match suffix {
        Some('n') => {
            if !integral {
                return Some((TokenKind::Invalid(ErrorCode::InvalidBigInt), None));
            }
            match BigInt::from_str(body.trim_start_matches('+')) {
                Ok(bi) => (TokenKind::BigInt, Some(Value::BigInt(bi))),
                Err(_) => (TokenKind::Invalid(ErrorCode::InvalidBigInt), None),
            }
        }
        Some(_) => match parse_decimal(body) {
            Some(d) => (TokenKind::Decimal, Some(Value::Decimal(d))),
            None => (TokenKind::Invalid(ErrorCode::InvalidDecimal), None),
        },
        None => {
            let number = if integral {
                match body.parse::<i64>() {
                    Ok(n) => Some(Number::Integer(n)),
                    Err(_) => body.parse::<f64>().ok().map(Number::Float),
                }
            } else {
                body.parse::<f64>().ok().map(Number::Float)
            };
            match number {
                Some(n) => (TokenKind::Number, Some(Value::Number(n))),
                None => (TokenKind::Invalid(ErrorCode::InvalidNumber), None),
            }
        }
    })
}

/// Parses decimal text, keeping the written scale (`50.00` has scale 2).
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim().trim_start_matches('+');
    let text = text.strip_suffix('m').unwrap_or(text);
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let full = match text.len() {
        4 => format!("{}-01-01", text),
        7 => format!("{}-01", text),
        _ => text.to_string(),
    };
    NaiveDate::parse_from_str(&full, "%Y-%m-%d").ok()
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`.
pub(crate) fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// RFC 3339, or a date with an optional time and offset. Values without an
/// offset are taken as UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let naive = text.strip_suffix('Z').unwrap_or(text);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }
    parse_date(naive)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub(crate) fn decode_base64(text: &str) -> Option<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .ok()
}
