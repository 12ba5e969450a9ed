//! Source positions and ranges.
//!
//! Positions are zero-based. Whether a position belongs to the requested
//! commit or to a bundle's indexed commit is up to the caller; nothing in
//! these types records the frame.

use std::fmt;

/// A line and character position in source text.
///
/// Both fields are 0-indexed internally, but displayed as 1-indexed.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Default,
    Ord,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed character offset within the line
    pub character: u32,
}

impl Position {
    /// Create a new Position.
    #[inline]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Get 1-indexed line number (for display).
    #[inline]
    pub const fn line_one_indexed(self) -> u32 {
        self.line.saturating_add(1)
    }

    /// Get 1-indexed character number (for display).
    #[inline]
    pub const fn character_one_indexed(self) -> u32 {
        self.character.saturating_add(1)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.character_one_indexed())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line_one_indexed(), self.character_one_indexed())
    }
}

/// A half-open range `[start, end)` within one document.
#[derive(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Default,
    Ord,
    PartialOrd,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a new Range.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range from raw line/character pairs.
    #[inline]
    pub const fn from_coords(
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    /// Check whether the position falls inside this range.
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position < self.end
    }

    /// Check whether any line of this range lies in `[start_line, end_line]`.
    pub fn intersects_lines(&self, start_line: u32, end_line: u32) -> bool {
        self.start.line <= end_line && self.end.line >= start_line
    }

    /// Shift both endpoints by a signed number of lines.
    ///
    /// Returns `None` if either endpoint would move before the first line.
    pub fn shift_lines(&self, delta: i64) -> Option<Self> {
        let shift = |line: u32| u32::try_from(i64::from(line) + delta).ok();
        Some(Self::from_coords(
            shift(self.start.line)?,
            self.start.character,
            shift(self.end.line)?,
            self.end.character,
        ))
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}-{:?}", self.start, self.end)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        let pos = Position::new(0, 0);
        assert_eq!(format!("{}", pos), "1:1");

        let pos = Position::new(5, 10);
        assert_eq!(format!("{}", pos), "6:11");
    }

    #[test]
    fn test_position_display_saturates_at_max() {
        let pos = Position::new(u32::MAX, u32::MAX);
        assert_eq!(pos.to_string(), format!("{}:{}", u32::MAX, u32::MAX));
    }

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(1, 9) < Position::new(2, 0));
        assert!(Position::new(2, 0) < Position::new(2, 1));
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let range = Range::from_coords(1, 4, 1, 8);

        assert!(range.contains(Position::new(1, 4)));
        assert!(range.contains(Position::new(1, 7)));
        assert!(!range.contains(Position::new(1, 8)));
        assert!(!range.contains(Position::new(0, 5)));
    }

    #[test]
    fn test_range_intersects_lines() {
        let range = Range::from_coords(3, 0, 5, 2);

        assert!(range.intersects_lines(0, 3));
        assert!(range.intersects_lines(4, 4));
        assert!(range.intersects_lines(5, 9));
        assert!(!range.intersects_lines(6, 9));
        assert!(!range.intersects_lines(0, 2));
    }

    #[test]
    fn test_range_shift_lines() {
        let range = Range::from_coords(3, 1, 4, 2);

        assert_eq!(range.shift_lines(2), Some(Range::from_coords(5, 1, 6, 2)));
        assert_eq!(range.shift_lines(-3), Some(Range::from_coords(0, 1, 1, 2)));
        assert_eq!(range.shift_lines(-4), None);
    }
}
