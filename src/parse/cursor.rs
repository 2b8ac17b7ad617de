//! Input adapters for the conflict parser.
//!
//! Two cursor flavors drive the same parser: [`BufferCursor`] walks a fully
//! materialized [`MarkerBuffer`] row by row, while [`ChunkCursor`] walks one
//! streamed chunk of text. In chunk mode a trailing line without a
//! terminator is not yet safe to classify, so the cursor reports end-of-input
//! there and exposes the marker-like tail for the caller to prepend to the
//! next chunk.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::buffer::MarkerBuffer;

/// First line of a conflict: seven `<` and a space, at a line start.
pub(crate) static CONFLICT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^<{7} ").unwrap());

/// A chunk tail that looks like the start of a boundary line: one to seven
/// repeats of a single marker character, optionally followed by description
/// text.
static PARTIAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:<{1,7}|\|{1,7}|={1,7}|>{1,7})").unwrap());

/// Uniform line cursor over either input mode.
pub trait LineCursor {
    /// Row index of the current line; `None` in chunk mode, where absolute
    /// rows are unknowable.
    fn current_row(&self) -> Option<usize>;

    /// Text of the current line, terminator included, or `None` at end.
    fn current_line(&self) -> Option<&str>;

    /// Move to the next line.
    fn advance(&mut self);

    /// No more classifiable lines.
    fn at_end(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Buffer cursor
// ---------------------------------------------------------------------------

/// Random-access cursor over a host buffer.
pub struct BufferCursor<'a> {
    buffer: &'a dyn MarkerBuffer,
    row: usize,
}

impl<'a> BufferCursor<'a> {
    pub fn new(buffer: &'a dyn MarkerBuffer, row: usize) -> Self {
        Self { buffer, row }
    }

    pub fn row(&self) -> usize {
        self.row
    }
}

impl LineCursor for BufferCursor<'_> {
    fn current_row(&self) -> Option<usize> {
        Some(self.row)
    }

    fn current_line(&self) -> Option<&str> {
        self.buffer.line(self.row)
    }

    fn advance(&mut self) {
        self.row += 1;
    }

    fn at_end(&self) -> bool {
        self.row >= self.buffer.line_count()
    }
}

// ---------------------------------------------------------------------------
// Chunk cursor
// ---------------------------------------------------------------------------

/// Streaming cursor over a single chunk of text.
pub struct ChunkCursor<'a> {
    chunk: &'a str,
    /// Byte offset of the current line's first character.
    line_start: usize,
}

impl<'a> ChunkCursor<'a> {
    pub fn new(chunk: &'a str) -> Self {
        Self {
            chunk,
            line_start: 0,
        }
    }

    /// Byte offset just past the current line's terminator, or `None` if the
    /// rest of the chunk holds no terminator.
    fn line_end(&self) -> Option<usize> {
        self.chunk[self.line_start..]
            .find('\n')
            .map(|i| self.line_start + i + 1)
    }

    /// Jump forward to the next match of `pattern` at a line start, without
    /// visiting the lines in between. Returns `false` when no match remains
    /// in the chunk.
    pub fn advance_to(&mut self, pattern: &Regex) -> bool {
        match pattern.find(&self.chunk[self.line_start..]) {
            Some(found) => {
                self.line_start += found.start();
                true
            }
            None => {
                // Park at the start of the unconsumed tail.
                self.line_start = self.chunk.rfind('\n').map_or(0, |i| i + 1);
                false
            }
        }
    }

    /// The chunk tail that may be the severed start of a boundary line.
    ///
    /// Prepending this to the next chunk is what keeps a marker line from
    /// being missed when a chunk boundary splits it.
    pub fn last_partial_marker(&self) -> &'a str {
        let tail_start = self.chunk.rfind('\n').map_or(0, |i| i + 1);
        let tail = &self.chunk[tail_start..];
        if PARTIAL_MARKER.is_match(tail) {
            tail
        } else {
            ""
        }
    }
}

impl LineCursor for ChunkCursor<'_> {
    fn current_row(&self) -> Option<usize> {
        None
    }

    fn current_line(&self) -> Option<&str> {
        self.line_end().map(|end| &self.chunk[self.line_start..end])
    }

    fn advance(&mut self) {
        if let Some(end) = self.line_end() {
            self.line_start = end;
        }
    }

    fn at_end(&self) -> bool {
        self.line_end().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    #[test]
    fn test_buffer_cursor_walk() {
        let buf = MemoryBuffer::from_text("one\ntwo\nthree\n");
        let mut cursor = BufferCursor::new(&buf, 0);

        assert_eq!(cursor.current_row(), Some(0));
        assert_eq!(cursor.current_line(), Some("one\n"));
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.current_line(), Some("three\n"));
        assert!(!cursor.at_end());
        cursor.advance();
        assert!(cursor.at_end());
        assert_eq!(cursor.current_line(), None);
    }

    #[test]
    fn test_chunk_cursor_stops_before_partial_line() {
        let mut cursor = ChunkCursor::new("complete\npartial");

        assert_eq!(cursor.current_line(), Some("complete\n"));
        assert!(!cursor.at_end());
        cursor.advance();
        // "partial" has no terminator and cannot be classified yet.
        assert!(cursor.at_end());
        assert_eq!(cursor.current_line(), None);
        assert_eq!(cursor.current_row(), None);
    }

    #[test]
    fn test_advance_to_conflict_start() {
        let mut cursor = ChunkCursor::new("aaa\nbbb\n<<<<<<< HEAD\nccc\n");
        assert!(cursor.advance_to(&CONFLICT_START));
        assert_eq!(cursor.current_line(), Some("<<<<<<< HEAD\n"));

        let mut missing = ChunkCursor::new("aaa\nbbb\n");
        assert!(!missing.advance_to(&CONFLICT_START));
    }

    #[test]
    fn test_advance_to_ignores_mid_line_markers() {
        let mut cursor = ChunkCursor::new("text <<<<<<< not a banner\n<<<<<<< HEAD\n");
        assert!(cursor.advance_to(&CONFLICT_START));
        assert_eq!(cursor.current_line(), Some("<<<<<<< HEAD\n"));
    }

    #[test]
    fn test_last_partial_marker() {
        assert_eq!(ChunkCursor::new("aaa\n<<<").last_partial_marker(), "<<<");
        assert_eq!(
            ChunkCursor::new("aaa\n<<<<<<< HE").last_partial_marker(),
            "<<<<<<< HE"
        );
        assert_eq!(ChunkCursor::new("aaa\n===").last_partial_marker(), "===");
        assert_eq!(ChunkCursor::new("aaa\nbbb").last_partial_marker(), "");
        assert_eq!(ChunkCursor::new("aaa\n").last_partial_marker(), "");
    }
}
