//! Source positions.
//!
//! Every token, AST node and error carries a [`PositionRange`] so diagnostics
//! can point at the exact text they refer to.
//!
//! - `row` and `col` are 1-based and count characters.
//! - `pos` is the 0-based byte offset into the source text.
//! - Ranges are half-open: `end` is the position just after the last character.

use std::fmt;

/// A single point in the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
    pub pos: usize,
}

impl Position {
    #[must_use]
    pub const fn new(row: usize, col: usize, pos: usize) -> Self {
        Position { row, col, pos }
    }

    /// The position of the first character of any input.
    #[must_use]
    pub const fn start() -> Self {
        Position {
            row: 1,
            col: 1,
            pos: 0,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

/// A half-open `[start, end)` span of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PositionRange {
    pub start: Position,
    pub end: Position,
}

impl PositionRange {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        PositionRange { start, end }
    }

    /// A zero-width range at `at`.
    #[must_use]
    pub const fn point(at: Position) -> Self {
        PositionRange { start: at, end: at }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.pos == self.end.pos
    }

    /// Byte length of the covered text.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.pos - self.start.pos
    }

    /// Smallest range covering both `self` and `other`.
    #[must_use]
    pub fn cover(&self, other: &PositionRange) -> PositionRange {
        let start = if other.start.pos < self.start.pos {
            other.start
        } else {
            self.start
        };
        let end = if other.end.pos > self.end.pos {
            other.end
        } else {
            self.end
        };
        PositionRange { start, end }
    }

    /// Returns the covered slice of `source`, if the offsets are in bounds.
    #[must_use]
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start.pos..self.end.pos)
    }
}

impl fmt::Display for PositionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.row == self.end.row {
            write!(f, "{}:{}-{}", self.start.row, self.start.col, self.end.col)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_orders_endpoints() {
        let a = PositionRange::new(Position::new(1, 5, 4), Position::new(1, 8, 7));
        let b = PositionRange::new(Position::new(1, 1, 0), Position::new(1, 3, 2));
        let c = a.cover(&b);
        assert_eq!(c.start.pos, 0);
        assert_eq!(c.end.pos, 7);
    }

    #[test]
    fn test_display() {
        let r = PositionRange::new(Position::new(2, 3, 10), Position::new(2, 9, 16));
        assert_eq!(r.to_string(), "2:3-9");
        let r = PositionRange::new(Position::new(2, 3, 10), Position::new(4, 1, 30));
        assert_eq!(r.to_string(), "2:3-4:1");
    }

    #[test]
    fn test_slice() {
        let src = "hello, world";
        let r = PositionRange::new(Position::new(1, 8, 7), Position::new(1, 13, 12));
        assert_eq!(r.slice(src), Some("world"));
    }
}
