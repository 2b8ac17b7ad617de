//! The parsed sub-regions of a conflict: banners, the separator, and sides.
//!
//! Each region holds a tracked-range handle into the host buffer plus the
//! text it had when parsed, so later modification can be detected by
//! comparing live text against the original (ignoring trailing newline
//! style).

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::buffer::{MarkerBuffer, RangeHandle, RowRange};
use crate::errors::BufferError;

use super::{Position, Source};

/// An unmodified separator: exactly `=======` with any newline style.
static SEPARATOR_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^=======\r?\n?$").unwrap());

/// Strip one trailing `\n` or `\r\n`.
fn trim_line_ending(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}

/// Compare two texts line by line, ignoring trailing newline style.
fn text_matches(current: &str, original: &str) -> bool {
    trim_line_ending(current) == trim_line_ending(original)
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// The single delimiter line introducing a side, e.g. `<<<<<<< HEAD`.
#[derive(Debug)]
pub struct Banner {
    marker: RangeHandle,
    description: String,
    original_text: String,
}

impl Banner {
    pub(crate) fn new(marker: RangeHandle, description: String, original_text: String) -> Self {
        Self {
            marker,
            description,
            original_text,
        }
    }

    pub fn marker(&self) -> RangeHandle {
        self.marker
    }

    /// The text after the seven marker characters, e.g. `HEAD`.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Whether the banner line differs from the text captured at parse time.
    pub fn is_modified(&self, buffer: &dyn MarkerBuffer) -> Result<bool, BufferError> {
        let current = buffer.text_in(buffer.marker_range(self.marker)?)?;
        Ok(!text_matches(&current, &self.original_text))
    }

    /// Restore the banner to its parse-time text.
    pub fn revert(&self, buffer: &mut dyn MarkerBuffer) -> Result<(), BufferError> {
        let range = buffer.marker_range(self.marker)?;
        buffer.set_text(range, &self.original_text)
    }
}

// ---------------------------------------------------------------------------
// Separator
// ---------------------------------------------------------------------------

/// The `=======` line shared by the whole conflict.
#[derive(Debug)]
pub struct Separator {
    marker: RangeHandle,
}

impl Separator {
    pub(crate) fn new(marker: RangeHandle) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> RangeHandle {
        self.marker
    }

    /// Whether the separator line is anything other than a bare `=======`.
    pub fn is_modified(&self, buffer: &dyn MarkerBuffer) -> Result<bool, BufferError> {
        let current = buffer.text_in(buffer.marker_range(self.marker)?)?;
        Ok(!SEPARATOR_LINE.is_match(&current))
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Classification of a side for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideKind {
    Ours,
    Base,
    Theirs,
    /// The side's text or banner no longer matches what was parsed.
    Modified,
}

/// One participant's text block within a conflict.
///
/// A side owns its banner exclusively; the separator belongs to the whole
/// conflict.
#[derive(Debug)]
pub struct Side {
    source: Source,
    position: Position,
    banner: Banner,
    marker: RangeHandle,
    original_text: String,
}

impl Side {
    pub(crate) fn new(
        source: Source,
        position: Position,
        banner: Banner,
        marker: RangeHandle,
        original_text: String,
    ) -> Self {
        Self {
            source,
            position,
            banner,
            marker,
            original_text,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn banner(&self) -> &Banner {
        &self.banner
    }

    /// Handle to the body-text range (banner excluded).
    pub fn marker(&self) -> RangeHandle {
        self.marker
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Current body text.
    pub fn text(&self, buffer: &dyn MarkerBuffer) -> Result<String, BufferError> {
        buffer.text_in(buffer.marker_range(self.marker)?)
    }

    pub fn is_empty(&self, buffer: &dyn MarkerBuffer) -> Result<bool, BufferError> {
        Ok(buffer.marker_range(self.marker)?.is_empty())
    }

    /// Whether the body text differs from the text captured at parse time.
    pub fn is_modified(&self, buffer: &dyn MarkerBuffer) -> Result<bool, BufferError> {
        let current = self.text(buffer)?;
        Ok(!text_matches(&current, &self.original_text))
    }

    pub fn is_banner_modified(&self, buffer: &dyn MarkerBuffer) -> Result<bool, BufferError> {
        self.banner.is_modified(buffer)
    }

    /// Display classification: the source's own kind, or `Modified` once the
    /// body or banner has been edited.
    pub fn kind(&self, buffer: &dyn MarkerBuffer) -> Result<SideKind, BufferError> {
        if self.is_modified(buffer)? || self.is_banner_modified(buffer)? {
            return Ok(SideKind::Modified);
        }
        Ok(match self.source {
            Source::Ours => SideKind::Ours,
            Source::Base => SideKind::Base,
            Source::Theirs => SideKind::Theirs,
        })
    }

    /// Restore the body text to its parse-time content.
    pub fn revert(&self, buffer: &mut dyn MarkerBuffer) -> Result<(), BufferError> {
        let range = buffer.marker_range(self.marker)?;
        buffer.set_text(range, &self.original_text)
    }

    /// The side's full extent: banner plus body.
    pub fn full_range(&self, buffer: &dyn MarkerBuffer) -> Result<RowRange, BufferError> {
        let banner = buffer.marker_range(self.banner.marker())?;
        let body = buffer.marker_range(self.marker)?;
        Ok(banner.union(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{InvalidationPolicy, MemoryBuffer};

    fn banner_fixture(buf: &mut MemoryBuffer, row: usize) -> Banner {
        let marker = buf
            .create_marker(RowRange::one_line(row), InvalidationPolicy::Surround)
            .unwrap();
        let original = buf.text_in(RowRange::one_line(row)).unwrap();
        Banner::new(marker, "HEAD".to_string(), original)
    }

    #[test]
    fn test_banner_modification_detection() {
        let mut buf = MemoryBuffer::from_text("<<<<<<< HEAD\nbody\n");
        let banner = banner_fixture(&mut buf, 0);

        assert!(!banner.is_modified(&buf).unwrap());

        buf.set_text(RowRange::one_line(0), "<<<<<<< mine now\n").unwrap();
        assert!(banner.is_modified(&buf).unwrap());

        banner.revert(&mut buf).unwrap();
        assert!(!banner.is_modified(&buf).unwrap());
        assert_eq!(buf.text(), "<<<<<<< HEAD\nbody\n");
    }

    #[test]
    fn test_banner_ignores_newline_style() {
        let mut buf = MemoryBuffer::from_text("<<<<<<< HEAD\r\nbody\n");
        let marker = buf
            .create_marker(RowRange::one_line(0), InvalidationPolicy::Surround)
            .unwrap();
        // Original captured with a bare \n; live text has \r\n.
        let banner = Banner::new(marker, "HEAD".to_string(), "<<<<<<< HEAD\n".to_string());
        assert!(!banner.is_modified(&buf).unwrap());
    }

    #[test]
    fn test_separator_modification_detection() {
        let mut buf = MemoryBuffer::from_text("=======\n");
        let marker = buf
            .create_marker(RowRange::one_line(0), InvalidationPolicy::Surround)
            .unwrap();
        let separator = Separator::new(marker);

        assert!(!separator.is_modified(&buf).unwrap());

        buf.set_text(RowRange::one_line(0), "==== hooray ====\n").unwrap();
        assert!(separator.is_modified(&buf).unwrap());
    }

    #[test]
    fn test_side_kind_tracks_modification() {
        let mut buf = MemoryBuffer::from_text("<<<<<<< HEAD\nbody\n");
        let banner = banner_fixture(&mut buf, 0);
        let body_marker = buf
            .create_marker(RowRange::one_line(1), InvalidationPolicy::None)
            .unwrap();
        let side = Side::new(
            Source::Ours,
            Position::Top,
            banner,
            body_marker,
            "body\n".to_string(),
        );

        assert_eq!(side.kind(&buf).unwrap(), SideKind::Ours);
        assert!(!side.is_modified(&buf).unwrap());

        buf.set_text(RowRange::one_line(1), "edited\n").unwrap();
        assert!(side.is_modified(&buf).unwrap());
        assert!(!side.is_banner_modified(&buf).unwrap());
        assert_eq!(side.kind(&buf).unwrap(), SideKind::Modified);

        side.revert(&mut buf).unwrap();
        assert_eq!(side.kind(&buf).unwrap(), SideKind::Ours);
    }

    #[test]
    fn test_side_full_range() {
        let mut buf = MemoryBuffer::from_text("<<<<<<< HEAD\none\ntwo\n");
        let banner = banner_fixture(&mut buf, 0);
        let body_marker = buf
            .create_marker(RowRange::new(1, 3), InvalidationPolicy::None)
            .unwrap();
        let side = Side::new(
            Source::Ours,
            Position::Top,
            banner,
            body_marker,
            "one\ntwo\n".to_string(),
        );
        assert_eq!(side.full_range(&buf).unwrap(), RowRange::new(0, 3));
    }
}
