//! Span constructors shared by the tokenizer, parser and validators.
//!
//! All four helpers expect ordered input. Passing an `end` that precedes its
//! `start` is a bug in the caller and trips a debug assertion.

use crate::position::{Position, PositionRange};
use crate::token::Token;

/// The span of a single token.
#[inline]
#[must_use]
pub fn token_range(token: &Token) -> PositionRange {
    token.range
}

/// From the start of `first` to the end of `last`, e.g. an opening bracket to
/// the last token consumed before a synchronization boundary.
#[must_use]
pub fn token_to_token(first: &Token, last: &Token) -> PositionRange {
    between(first.range.start, last.range.end)
}

/// From the start of an unclosed `opener` to the current scan position, used
/// when input ends inside a construct.
#[must_use]
pub fn unclosed(opener: &Token, scan_pos: Position) -> PositionRange {
    between(opener.range.start, scan_pos)
}

/// An arbitrary span between two positions.
#[must_use]
pub fn between(start: Position, end: Position) -> PositionRange {
    debug_assert!(
        start.pos <= end.pos,
        "range start {} is after end {}",
        start,
        end
    );
    PositionRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(start: usize, end: usize) -> Token {
        Token {
            kind: TokenKind::Comma,
            raw: ",".to_string(),
            value: None,
            range: PositionRange::new(
                Position::new(1, start + 1, start),
                Position::new(1, end + 1, end),
            ),
        }
    }

    #[test]
    fn test_token_to_token_spans_both() {
        let r = token_to_token(&tok(2, 3), &tok(10, 11));
        assert_eq!(r.start.pos, 2);
        assert_eq!(r.end.pos, 11);
    }

    #[test]
    fn test_unclosed_runs_to_scan_position() {
        let r = unclosed(&tok(0, 1), Position::new(3, 4, 25));
        assert_eq!(r.start.pos, 0);
        assert_eq!(r.end.row, 3);
    }

    #[test]
    fn test_single_token() {
        let t = tok(4, 5);
        assert_eq!(token_range(&t), t.range);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn test_reversed_positions_panic_in_debug() {
        let _ = between(Position::new(1, 5, 4), Position::new(1, 1, 0));
    }
}
