//! Source positions for AST nodes and diagnostics.
//!
//! Nodes carry a [`TextRange`] (byte offsets into the document). Diagnostics
//! store a [`TextSpan`]; [`LineMap`] turns offsets into the 1-based
//! line/column pairs editors show.

use std::fmt;

/// A byte offset into a document.
pub type TextPos = u32;

/// A start offset plus a length.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// The end position of this span (exclusive).
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start && pos < self.end()
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// The first and one-past-last byte of a node.
///
/// Parent ranges always enclose the ranges of their children; scope
/// queries by offset rely on that.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextRange {
    /// Inclusive.
    pub pos: TextPos,
    /// Exclusive.
    pub end: TextPos,
}

impl TextRange {
    #[inline]
    pub fn new(pos: TextPos, end: TextPos) -> Self {
        Self { pos, end }
    }

    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { pos, end: pos }
    }

    #[inline]
    pub fn len(&self) -> TextPos {
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.end
    }

    #[inline]
    pub fn to_span(&self) -> TextSpan {
        TextSpan::new(self.pos, self.len())
    }

    /// Whether `pos` lies inside this range. The end offset counts as
    /// inside so a cursor placed right after a token still hits it.
    #[inline]
    pub fn contains_offset(&self, pos: TextPos) -> bool {
        pos >= self.pos && pos <= self.end
    }

    /// Whether `other` lies entirely inside this range.
    #[inline]
    pub fn encloses(&self, other: &TextRange) -> bool {
        other.pos >= self.pos && other.end <= self.end
    }

    /// The smallest range covering both.
    pub fn cover(&self, other: &TextRange) -> TextRange {
        TextRange::new(self.pos.min(other.pos), self.end.max(other.end))
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pos, self.end)
    }
}

impl From<TextRange> for TextSpan {
    fn from(range: TextRange) -> Self {
        range.to_span()
    }
}

/// A 1-based line and column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Offsets of line starts, built once per document text.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<TextPos>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// 0-based line of an offset.
    pub fn line_of(&self, pos: TextPos) -> u32 {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line as u32,
            Err(line) => line.saturating_sub(1) as u32,
        }
    }

    pub fn location_of(&self, pos: TextPos) -> SourceLocation {
        let line = self.line_of(pos);
        let line_start = self.line_starts[line as usize];
        SourceLocation {
            line: line + 1,
            column: pos - line_start + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_encloses_and_cover() {
        let outer = TextRange::new(0, 20);
        let inner = TextRange::new(4, 9);
        assert!(outer.encloses(&inner));
        assert!(!inner.encloses(&outer));
        assert_eq!(inner.cover(&TextRange::new(12, 15)), TextRange::new(4, 15));
    }

    #[test]
    fn test_range_contains_offset_is_end_inclusive() {
        let range = TextRange::new(3, 6);
        assert!(range.contains_offset(3));
        assert!(range.contains_offset(6));
        assert!(!range.contains_offset(7));
        assert!(!range.contains_offset(2));
    }

    #[test]
    fn test_range_to_span() {
        let span = TextRange::new(5, 15).to_span();
        assert_eq!(span.start, 5);
        assert_eq!(span.length, 10);
        assert_eq!(span.end(), 15);
    }

    #[test]
    fn test_line_map_locations_are_one_based() {
        let text = "Item {\n    id: root\n}";
        let map = LineMap::new(text);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.location_of(0), SourceLocation { line: 1, column: 1 });
        assert_eq!(map.location_of(11), SourceLocation { line: 2, column: 5 });
        assert_eq!(map.location_of(20), SourceLocation { line: 3, column: 1 });
    }
}
