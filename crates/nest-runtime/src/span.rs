//! Source locations
//!
//! Spans are character offsets into one attempt's source text plus the
//! 1-based line/column of the first character.

use serde::{Deserialize, Serialize};

/// A range of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive)
    pub end: usize,
    /// Line of `start` (1-based)
    pub line: usize,
    /// Column of `start` (1-based)
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Placeholder span for values that did not come from source text
    pub fn dummy() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest_position() {
        let a = Span::new(10, 12, 2, 3);
        let b = Span::new(2, 5, 1, 3);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(2, 12, 1, 3));
    }

    #[test]
    fn test_len() {
        assert_eq!(Span::new(3, 8, 1, 4).len(), 5);
        assert!(Span::dummy().is_empty());
    }
}
