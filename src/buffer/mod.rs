//! Host text-buffer collaborator contract.
//!
//! The engine never owns raw text storage. Everything it needs from the
//! editing surface is expressed by the [`MarkerBuffer`] trait: random line
//! access, row-range text read/replace, tracked ranges ("markers") that
//! follow surrounding edits, and a scoped transaction for atomic multi-edit
//! resolution. [`memory::MemoryBuffer`] is a complete in-crate
//! implementation for tests and embedders without a host editor.
//!
//! All ranges are whole-line row ranges; markers are arena handles into a
//! per-buffer table, never pointers into buffer internals.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::errors::BufferError;

pub use memory::MemoryBuffer;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A buffer position: row plus column within the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A half-open range of buffer rows, `start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A single row, `row..row + 1`.
    pub fn one_line(row: usize) -> Self {
        Self {
            start: row,
            end: row + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains_row(&self, row: usize) -> bool {
        self.start <= row && row < self.end
    }

    /// The smallest range covering both `self` and `other`.
    pub fn union(&self, other: RowRange) -> RowRange {
        RowRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for RowRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// How a tracked range reacts when an edit deletes its entire content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidationPolicy {
    /// Collapse to an invalid, empty range when fully deleted.
    Surround,
    /// Stay valid (empty) even when fully deleted.
    None,
}

/// Handle to a tracked range owned by the host buffer.
///
/// Handles are indices into a per-buffer marker table; they are cheap to
/// copy and remain stable for the lifetime of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeHandle(pub(crate) usize);

impl RangeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Buffer trait
// ---------------------------------------------------------------------------

/// The host text-editing surface, as seen by the engine.
///
/// Lines returned by [`line`](MarkerBuffer::line) include their terminator
/// (`\n` or `\r\n`) except possibly the final line of the buffer.
pub trait MarkerBuffer {
    /// The text of one line, or `None` past the end of the buffer.
    fn line(&self, row: usize) -> Option<&str>;

    /// Total number of lines.
    fn line_count(&self) -> usize;

    /// Index of the last line (0 for an empty buffer).
    fn last_row(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// Concatenated text of the rows in `range`.
    fn text_in(&self, range: RowRange) -> Result<String, BufferError>;

    /// Replace the rows in `range` with `text`, adjusting all markers.
    ///
    /// `text` is line-oriented: if it is non-empty and does not end with a
    /// terminator, its final fragment joins the line that followed `range`.
    fn set_text(&mut self, range: RowRange, text: &str) -> Result<(), BufferError>;

    /// Create a tracked range over `range`.
    fn create_marker(
        &mut self,
        range: RowRange,
        policy: InvalidationPolicy,
    ) -> Result<RangeHandle, BufferError>;

    /// Release a tracked range. The handle becomes stale.
    fn destroy_marker(&mut self, handle: RangeHandle) -> Result<(), BufferError>;

    /// Current range of a tracked range.
    fn marker_range(&self, handle: RangeHandle) -> Result<RowRange, BufferError>;

    /// Move a tracked range to a new range.
    fn set_marker_range(&mut self, handle: RangeHandle, range: RowRange)
        -> Result<(), BufferError>;

    /// Whether a tracked range is still valid (see [`InvalidationPolicy`]).
    fn marker_valid(&self, handle: RangeHandle) -> Result<bool, BufferError>;

    /// Run `f` as one atomic edit group (one undo step in hosts with undo).
    fn transact(
        &mut self,
        f: &mut dyn FnMut(&mut dyn MarkerBuffer) -> Result<(), BufferError>,
    ) -> Result<(), BufferError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_basics() {
        let r = RowRange::new(2, 5);
        assert_eq!(r.len(), 3);
        assert!(!r.is_empty());
        assert!(r.contains_row(2));
        assert!(r.contains_row(4));
        assert!(!r.contains_row(5));

        let one = RowRange::one_line(7);
        assert_eq!(one, RowRange::new(7, 8));
    }

    #[test]
    fn test_row_range_union() {
        let a = RowRange::new(2, 5);
        let b = RowRange::new(4, 9);
        assert_eq!(a.union(b), RowRange::new(2, 9));
        assert_eq!(b.union(a), RowRange::new(2, 9));
    }

    #[test]
    fn test_empty_range() {
        let r = RowRange::new(3, 3);
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
        assert!(!r.contains_row(3));
    }
}
