//! Error types for tokenizing, parsing, and validating Internet Object text.
//!
//! ## Error Categories
//!
//! - **Syntax**: tokenizer and parser failures (unterminated strings, unclosed
//!   brackets, unexpected tokens, positional-after-keyed members)
//! - **Validation**: a value violates its member definition (`valueRequired`,
//!   `nullNotAllowed`, `invalidChoice`, ranges, lengths, patterns, scale)
//! - **Reference**: `@variable` / `$schema` lookups that fail or loop
//! - **Schema**: a schema definition itself is malformed or unsupported
//!
//! Every error carries a stable [`ErrorCode`], a human-readable message and,
//! when the failure can be tied to source text, a [`PositionRange`].
//!
//! ## Examples
//!
//! ```rust
//! use internet_object::{parse, ErrorCode};
//!
//! let err = parse("{a, b").unwrap_err();
//! assert_eq!(err.code(), ErrorCode::ExpectingBracket);
//! assert!(err.range().is_some());
//! ```

use crate::position::PositionRange;
use std::fmt;
use thiserror::Error;

/// Stable identifiers for every error the crate can raise.
///
/// The [`fmt::Display`] form (see [`ErrorCode::as_str`]) is part of the public
/// contract and does not change between releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Syntax
    StringNotClosed,
    UnexpectedToken,
    UnexpectedEndOfInput,
    ExpectingBracket,
    PositionalMemberAfterKeywordMember,
    InvalidKey,
    EmptyArrayElement,
    MaxDepthExceeded,
    InvalidNumber,
    InvalidDecimal,
    InvalidBigInt,
    InvalidDate,
    InvalidTime,
    InvalidDateTime,
    InvalidBase64,

    // Schema
    InvalidSchema,
    InvalidType,
    InvalidConstraint,
    NotSupported,

    // Validation
    ValueRequired,
    NullNotAllowed,
    InvalidChoice,
    TypeMismatch,
    OutOfRange,
    InvalidLength,
    PatternMismatch,
    InvalidScale,
    InvalidPrecision,
    NotMultipleOf,
    UnknownMember,
    DuplicateMember,
    AdditionalValuesNotAllowed,
    /// Host-value conversion through serde failed.
    ConversionFailed,

    // Reference
    VariableNotDefined,
    SchemaNotDefined,
    CircularReference,
}

impl ErrorCode {
    /// Returns the stable identifier for this code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StringNotClosed => "stringNotClosed",
            ErrorCode::UnexpectedToken => "unexpectedToken",
            ErrorCode::UnexpectedEndOfInput => "unexpectedEndOfInput",
            ErrorCode::ExpectingBracket => "expectingBracket",
            ErrorCode::PositionalMemberAfterKeywordMember => {
                "positionalMemberAfterKeywordMember"
            }
            ErrorCode::InvalidKey => "invalidKey",
            ErrorCode::EmptyArrayElement => "emptyArrayElement",
            ErrorCode::MaxDepthExceeded => "maxDepthExceeded",
            ErrorCode::InvalidNumber => "invalidNumber",
            ErrorCode::InvalidDecimal => "invalidDecimal",
            ErrorCode::InvalidBigInt => "invalidBigInt",
            ErrorCode::InvalidDate => "invalidDate",
            ErrorCode::InvalidTime => "invalidTime",
            ErrorCode::InvalidDateTime => "invalidDateTime",
            ErrorCode::InvalidBase64 => "invalidBase64",
            ErrorCode::InvalidSchema => "invalidSchema",
            ErrorCode::InvalidType => "invalidType",
            ErrorCode::InvalidConstraint => "invalidConstraint",
            ErrorCode::NotSupported => "notSupported",
            ErrorCode::ValueRequired => "valueRequired",
            ErrorCode::NullNotAllowed => "nullNotAllowed",
            ErrorCode::InvalidChoice => "invalidChoice",
            ErrorCode::TypeMismatch => "typeMismatch",
            ErrorCode::OutOfRange => "outOfRange",
            ErrorCode::InvalidLength => "invalidLength",
            ErrorCode::PatternMismatch => "patternMismatch",
            ErrorCode::InvalidScale => "invalidScale",
            ErrorCode::InvalidPrecision => "invalidPrecision",
            ErrorCode::NotMultipleOf => "notMultipleOf",
            ErrorCode::UnknownMember => "unknownMember",
            ErrorCode::DuplicateMember => "duplicateMember",
            ErrorCode::AdditionalValuesNotAllowed => "additionalValuesNotAllowed",
            ErrorCode::ConversionFailed => "conversionFailed",
            ErrorCode::VariableNotDefined => "variableNotDefined",
            ErrorCode::SchemaNotDefined => "schemaNotDefined",
            ErrorCode::CircularReference => "circularReference",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad class of an [`Error`], used to decide how it is recovered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Syntax,
    Validation,
    Reference,
    Schema,
}

/// Represents every failure raised while tokenizing, parsing or validating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Tokenizer or parser error; always tied to source text.
    #[error("Syntax error at {range}: {message} ({code})")]
    Syntax {
        code: ErrorCode,
        message: String,
        range: PositionRange,
    },

    /// A value does not satisfy its member definition.
    #[error("Validation error{}: {message} ({code})", at(.range))]
    Validation {
        code: ErrorCode,
        message: String,
        range: Option<PositionRange>,
    },

    /// A variable or schema reference could not be resolved.
    #[error("Reference error{}: {message} ({code})", at(.range))]
    Reference {
        code: ErrorCode,
        message: String,
        range: Option<PositionRange>,
    },

    /// A schema definition is malformed or uses an unsupported type.
    #[error("Schema error{}: {message} ({code})", at(.range))]
    Schema {
        code: ErrorCode,
        message: String,
        range: Option<PositionRange>,
    },
}

fn at(range: &Option<PositionRange>) -> String {
    range.map(|r| format!(" at {}", r)).unwrap_or_default()
}

impl Error {
    /// Creates a syntax error covering `range`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use internet_object::{Error, ErrorCode, PositionRange};
    ///
    /// let err = Error::syntax(ErrorCode::UnexpectedToken, "unexpected ':'", PositionRange::default());
    /// assert!(err.to_string().contains("unexpectedToken"));
    /// ```
    pub fn syntax(code: ErrorCode, message: impl Into<String>, range: PositionRange) -> Self {
        Error::Syntax {
            code,
            message: message.into(),
            range,
        }
    }

    /// Creates a validation error, optionally tied to source text.
    pub fn validation(
        code: ErrorCode,
        message: impl Into<String>,
        range: Option<PositionRange>,
    ) -> Self {
        Error::Validation {
            code,
            message: message.into(),
            range,
        }
    }

    /// Creates a reference error (`variableNotDefined`, `schemaNotDefined`,
    /// `circularReference`).
    pub fn reference(
        code: ErrorCode,
        message: impl Into<String>,
        range: Option<PositionRange>,
    ) -> Self {
        Error::Reference {
            code,
            message: message.into(),
            range,
        }
    }

    /// Creates a schema-definition error.
    pub fn schema(code: ErrorCode, message: impl Into<String>, range: Option<PositionRange>) -> Self {
        Error::Schema {
            code,
            message: message.into(),
            range,
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Syntax { code, .. }
            | Error::Validation { code, .. }
            | Error::Reference { code, .. }
            | Error::Schema { code, .. } => *code,
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Error::Syntax { message, .. }
            | Error::Validation { message, .. }
            | Error::Reference { message, .. }
            | Error::Schema { message, .. } => message,
        }
    }

    #[must_use]
    pub fn range(&self) -> Option<PositionRange> {
        match self {
            Error::Syntax { range, .. } => Some(*range),
            Error::Validation { range, .. }
            | Error::Reference { range, .. }
            | Error::Schema { range, .. } => *range,
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Syntax { .. } => ErrorCategory::Syntax,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Reference { .. } => ErrorCategory::Reference,
            Error::Schema { .. } => ErrorCategory::Schema,
        }
    }

    /// Attaches `range` if the error does not carry one yet.
    #[must_use]
    pub fn with_range(mut self, range: PositionRange) -> Self {
        match &mut self {
            Error::Syntax { .. } => {}
            Error::Validation { range: r, .. }
            | Error::Reference { range: r, .. }
            | Error::Schema { range: r, .. } => {
                if r.is_none() {
                    *r = Some(range);
                }
            }
        }
        self
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::validation(ErrorCode::ConversionFailed, msg.to_string(), None)
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::validation(ErrorCode::ConversionFailed, msg.to_string(), None)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_display_includes_code_and_position() {
        let range = PositionRange::new(Position::new(3, 5, 20), Position::new(3, 9, 24));
        let err = Error::syntax(ErrorCode::StringNotClosed, "string not closed", range);
        let text = err.to_string();
        assert!(text.contains("3:5-9"));
        assert!(text.contains("stringNotClosed"));
    }

    #[test]
    fn test_validation_without_range() {
        let err = Error::validation(ErrorCode::ValueRequired, "value required for 'name'", None);
        assert_eq!(
            err.to_string(),
            "Validation error: value required for 'name' (valueRequired)"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_with_range_keeps_existing() {
        let first = PositionRange::point(Position::new(1, 2, 1));
        let second = PositionRange::point(Position::new(9, 9, 99));
        let err = Error::reference(ErrorCode::VariableNotDefined, "x", None)
            .with_range(first)
            .with_range(second);
        assert_eq!(err.range(), Some(first));
    }
}
