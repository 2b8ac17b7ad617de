//! In-memory [`MarkerBuffer`] implementation.
//!
//! Line-based storage with a marker table adjusted on every splice. Edits
//! apply immediately; [`transact`](MarkerBuffer::transact) only groups them
//! (the buffer is single-threaded and has no undo stack, so atomicity is
//! trivially satisfied).

use tracing::trace;

use crate::errors::BufferError;

use super::{InvalidationPolicy, MarkerBuffer, RangeHandle, RowRange};

#[derive(Debug, Clone)]
struct MarkerEntry {
    range: RowRange,
    policy: InvalidationPolicy,
    valid: bool,
    alive: bool,
}

/// A text buffer held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    /// Each line keeps its terminator, except possibly the last.
    lines: Vec<String>,
    markers: Vec<MarkerEntry>,
    transaction_depth: usize,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
            markers: Vec::new(),
            transaction_depth: 0,
        }
    }

    /// The entire buffer contents.
    pub fn text(&self) -> String {
        self.lines.concat()
    }

    /// Number of live markers.
    pub fn marker_count(&self) -> usize {
        self.markers.iter().filter(|m| m.alive).count()
    }

    fn entry(&self, handle: RangeHandle) -> Result<&MarkerEntry, BufferError> {
        self.markers
            .get(handle.0)
            .filter(|m| m.alive)
            .ok_or(BufferError::StaleMarker(handle.0))
    }

    fn entry_mut(&mut self, handle: RangeHandle) -> Result<&mut MarkerEntry, BufferError> {
        self.markers
            .get_mut(handle.0)
            .filter(|m| m.alive)
            .ok_or(BufferError::StaleMarker(handle.0))
    }

    fn check_range(&self, range: RowRange) -> Result<(), BufferError> {
        if range.end < range.start || range.end > self.lines.len() {
            return Err(BufferError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    /// Adjust one row position for a splice of `start..old_end` into
    /// `start..new_end`.
    ///
    /// Positions at an insertion point stay put: the resolution algorithm
    /// repositions the affected markers itself after appending side text.
    fn adjust_position(position: usize, start: usize, old_end: usize, new_end: usize) -> usize {
        if old_end == start {
            // Pure insertion.
            if position <= start {
                position
            } else {
                position + (new_end - start)
            }
        } else if position <= start {
            position
        } else if position >= old_end {
            position - old_end + new_end
        } else {
            new_end
        }
    }

    fn adjust_markers(&mut self, start: usize, old_end: usize, new_len: usize) {
        let new_end = start + new_len;
        for marker in self.markers.iter_mut().filter(|m| m.alive) {
            let surrounded = marker.range.start >= start
                && marker.range.end <= old_end
                && !marker.range.is_empty();
            if new_len == 0
                && old_end > start
                && surrounded
                && marker.policy == InvalidationPolicy::Surround
            {
                marker.valid = false;
            }
            marker.range.start =
                Self::adjust_position(marker.range.start, start, old_end, new_end);
            marker.range.end = Self::adjust_position(marker.range.end, start, old_end, new_end);
            if marker.range.end < marker.range.start {
                marker.range.end = marker.range.start;
            }
        }
    }
}

impl MarkerBuffer for MemoryBuffer {
    fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn text_in(&self, range: RowRange) -> Result<String, BufferError> {
        self.check_range(range)?;
        Ok(self.lines[range.start..range.end].concat())
    }

    fn set_text(&mut self, range: RowRange, text: &str) -> Result<(), BufferError> {
        self.check_range(range)?;

        let mut new_lines: Vec<String> = text.split_inclusive('\n').map(str::to_string).collect();
        let mut old_end = range.end;

        // A trailing fragment without a terminator joins the following line.
        if let Some(last) = new_lines.last_mut() {
            if !last.ends_with('\n') && old_end < self.lines.len() {
                last.push_str(&self.lines[old_end]);
                old_end += 1;
            }
        }

        let new_len = new_lines.len();
        trace!(start = range.start, old_end, new_len, "splicing rows");
        self.lines.splice(range.start..old_end, new_lines);
        self.adjust_markers(range.start, old_end, new_len);
        Ok(())
    }

    fn create_marker(
        &mut self,
        range: RowRange,
        policy: InvalidationPolicy,
    ) -> Result<RangeHandle, BufferError> {
        self.check_range(range)?;
        self.markers.push(MarkerEntry {
            range,
            policy,
            valid: true,
            alive: true,
        });
        Ok(RangeHandle(self.markers.len() - 1))
    }

    fn destroy_marker(&mut self, handle: RangeHandle) -> Result<(), BufferError> {
        self.entry_mut(handle)?.alive = false;
        Ok(())
    }

    fn marker_range(&self, handle: RangeHandle) -> Result<RowRange, BufferError> {
        Ok(self.entry(handle)?.range)
    }

    fn set_marker_range(
        &mut self,
        handle: RangeHandle,
        range: RowRange,
    ) -> Result<(), BufferError> {
        self.check_range(range)?;
        let entry = self.entry_mut(handle)?;
        entry.range = range;
        entry.valid = true;
        Ok(())
    }

    fn marker_valid(&self, handle: RangeHandle) -> Result<bool, BufferError> {
        Ok(self.entry(handle)?.valid)
    }

    fn transact(
        &mut self,
        f: &mut dyn FnMut(&mut dyn MarkerBuffer) -> Result<(), BufferError>,
    ) -> Result<(), BufferError> {
        self.transaction_depth += 1;
        let result = f(self);
        self.transaction_depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> MemoryBuffer {
        MemoryBuffer::from_text("alpha\nbravo\ncharlie\ndelta\n")
    }

    #[test]
    fn test_line_access() {
        let buf = buffer();
        assert_eq!(buf.line_count(), 4);
        assert_eq!(buf.last_row(), 3);
        assert_eq!(buf.line(1), Some("bravo\n"));
        assert_eq!(buf.line(4), None);
    }

    #[test]
    fn test_final_line_without_terminator() {
        let buf = MemoryBuffer::from_text("one\ntwo");
        assert_eq!(buf.line_count(), 2);
        assert_eq!(buf.line(1), Some("two"));
        assert_eq!(buf.text(), "one\ntwo");
    }

    #[test]
    fn test_text_in_range() {
        let buf = buffer();
        assert_eq!(buf.text_in(RowRange::new(1, 3)).unwrap(), "bravo\ncharlie\n");
        assert_eq!(buf.text_in(RowRange::new(2, 2)).unwrap(), "");
        assert!(buf.text_in(RowRange::new(2, 9)).is_err());
    }

    #[test]
    fn test_replace_rows() {
        let mut buf = buffer();
        buf.set_text(RowRange::new(1, 3), "BRAVO\n").unwrap();
        assert_eq!(buf.text(), "alpha\nBRAVO\ndelta\n");
    }

    #[test]
    fn test_delete_rows() {
        let mut buf = buffer();
        buf.set_text(RowRange::new(0, 2), "").unwrap();
        assert_eq!(buf.text(), "charlie\ndelta\n");
    }

    #[test]
    fn test_markers_shift_on_edit_above() {
        let mut buf = buffer();
        let marker = buf
            .create_marker(RowRange::new(2, 3), InvalidationPolicy::None)
            .unwrap();
        buf.set_text(RowRange::new(0, 1), "a1\na2\n").unwrap();
        assert_eq!(buf.marker_range(marker).unwrap(), RowRange::new(3, 4));
        assert_eq!(buf.text_in(buf.marker_range(marker).unwrap()).unwrap(), "charlie\n");
    }

    #[test]
    fn test_marker_expands_when_its_range_is_replaced() {
        let mut buf = buffer();
        let marker = buf
            .create_marker(RowRange::new(1, 2), InvalidationPolicy::None)
            .unwrap();
        buf.set_text(RowRange::new(1, 2), "x\ny\nz\n").unwrap();
        assert_eq!(buf.marker_range(marker).unwrap(), RowRange::new(1, 4));
    }

    #[test]
    fn test_surround_marker_invalidated_by_deletion() {
        let mut buf = buffer();
        let surround = buf
            .create_marker(RowRange::new(1, 2), InvalidationPolicy::Surround)
            .unwrap();
        let keep = buf
            .create_marker(RowRange::new(1, 2), InvalidationPolicy::None)
            .unwrap();

        buf.set_text(RowRange::new(1, 2), "").unwrap();

        assert!(!buf.marker_valid(surround).unwrap());
        assert!(buf.marker_valid(keep).unwrap());
        assert!(buf.marker_range(keep).unwrap().is_empty());
    }

    #[test]
    fn test_stale_handle() {
        let mut buf = buffer();
        let marker = buf
            .create_marker(RowRange::new(0, 1), InvalidationPolicy::None)
            .unwrap();
        buf.destroy_marker(marker).unwrap();
        assert!(matches!(
            buf.marker_range(marker),
            Err(BufferError::StaleMarker(_))
        ));
    }

    #[test]
    fn test_transact_groups_edits() {
        let mut buf = buffer();
        buf.transact(&mut |b| {
            b.set_text(RowRange::new(0, 1), "first\n")?;
            b.set_text(RowRange::new(3, 4), "last\n")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(buf.text(), "first\nbravo\ncharlie\nlast\n");
    }
}
