//! Tokens produced by the [`Tokenizer`](crate::tokenizer::Tokenizer).

use crate::error::ErrorCode;
use crate::position::PositionRange;
use crate::value::Value;
use std::fmt;

/// The lexical class of a [`Token`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `{`
    CurlyOpen,
    /// `}`
    CurlyClose,
    /// `[`
    BracketOpen,
    /// `]`
    BracketClose,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `~` collection item marker
    Tilde,
    /// `---` section separator
    SectionSep,

    /// Quoted, raw or open string
    String,
    /// Integer or float, including `Inf`/`NaN`
    Number,
    /// `…m` literal
    Decimal,
    /// `…n` literal
    BigInt,
    /// `T`, `F`, `true`, `false`
    Boolean,
    /// `N`, `null`
    Null,
    /// `d"…"`
    Date,
    /// `t"…"`
    Time,
    /// `dt"…"`
    DateTime,
    /// `b64"…"`
    Binary,

    /// `@name`
    Variable,
    /// `$name`
    SchemaRef,

    /// A literal whose text could not be decoded. The parser reports it with
    /// the carried code when it reaches the token.
    Invalid(ErrorCode),
}

impl TokenKind {
    /// `true` for tokens that can stand on their own as a value.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::Number
                | TokenKind::Decimal
                | TokenKind::BigInt
                | TokenKind::Boolean
                | TokenKind::Null
                | TokenKind::Date
                | TokenKind::Time
                | TokenKind::DateTime
                | TokenKind::Binary
                | TokenKind::Variable
                | TokenKind::SchemaRef
                | TokenKind::Invalid(_)
        )
    }

    /// `true` for `~`, `---`: places the parser can resume after an error.
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        matches!(self, TokenKind::Tilde | TokenKind::SectionSep)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::CurlyOpen => "'{'",
            TokenKind::CurlyClose => "'}'",
            TokenKind::BracketOpen => "'['",
            TokenKind::BracketClose => "']'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Tilde => "'~'",
            TokenKind::SectionSep => "'---'",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Decimal => "decimal",
            TokenKind::BigInt => "bigint",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::Date => "date",
            TokenKind::Time => "time",
            TokenKind::DateTime => "datetime",
            TokenKind::Binary => "base64",
            TokenKind::Variable => "variable",
            TokenKind::SchemaRef => "schema reference",
            TokenKind::Invalid(_) => "invalid literal",
        };
        f.write_str(s)
    }
}

/// A lexeme with its decoded value and source span. Immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source text exactly as written (trimmed for open strings).
    pub raw: String,
    /// Decoded value for scalar tokens; `None` for punctuation and invalid
    /// literals. References carry their sigiled name as a string.
    pub value: Option<Value>,
    pub range: PositionRange,
}

impl Token {
    /// The string payload of string, variable and schema-reference tokens.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match (&self.kind, &self.value) {
            (
                TokenKind::String | TokenKind::Variable | TokenKind::SchemaRef,
                Some(Value::String(s)),
            ) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
