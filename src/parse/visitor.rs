//! Strategies applied as the parser recognizes each region of a conflict.
//!
//! [`NoopVisitor`] lets a parse run purely for recognition (counting,
//! nested-conflict skipping). [`ConflictAssembler`] records the geometry of
//! every region and materializes buffer markers only once the whole
//! conflict has parsed, so a failed candidate leaves nothing behind.

use crate::buffer::{InvalidationPolicy, MarkerBuffer, RowRange};
use crate::errors::BufferError;
use crate::model::regions::{Banner, Separator, Side};
use crate::model::{Conflict, Position, Source};

/// Callbacks invoked in textual order as regions are recognized.
///
/// Row arguments are meaningful only when parsing over a buffer cursor;
/// chunk parses report placeholder rows.
pub trait ConflictVisitor {
    fn visit_our_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        let _ = (position, banner_row, text_start, text_end);
    }

    fn visit_base_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        let _ = (position, banner_row, text_start, text_end);
    }

    fn visit_their_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        let _ = (position, banner_row, text_start, text_end);
    }

    fn visit_separator(&mut self, row: usize) {
        let _ = row;
    }
}

/// Recognize without recording anything.
#[derive(Debug, Default)]
pub struct NoopVisitor;

impl ConflictVisitor for NoopVisitor {}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SideRegion {
    position: Position,
    banner_row: usize,
    text_start: usize,
    text_end: usize,
}

/// Records the rows of every region, then builds a [`Conflict`] with live
/// buffer markers on success.
#[derive(Debug, Default)]
pub struct ConflictAssembler {
    ours: Option<SideRegion>,
    base: Option<SideRegion>,
    theirs: Option<SideRegion>,
    separator_row: Option<usize>,
}

impl ConflictAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The row just past the last recognized region, for advancing a scan.
    pub fn end_row(&self) -> Option<usize> {
        let bottom = [self.ours, self.base, self.theirs]
            .into_iter()
            .flatten()
            .find(|region| region.position == Position::Bottom)?;
        // The bottom side's banner is its footer line.
        Some(bottom.banner_row + 1)
    }

    /// Create markers for every recorded region and assemble the conflict.
    ///
    /// Returns `None` when called before both OURS and THEIRS were visited.
    pub fn materialize(
        self,
        buffer: &mut dyn MarkerBuffer,
    ) -> Result<Option<Conflict>, BufferError> {
        let (Some(ours), Some(theirs)) = (self.ours, self.theirs) else {
            return Ok(None);
        };
        let Some(separator_row) = self.separator_row else {
            return Ok(None);
        };

        let ours = build_side(buffer, Source::Ours, ours)?;
        let theirs = build_side(buffer, Source::Theirs, theirs)?;
        let base = self
            .base
            .map(|region| build_side(buffer, Source::Base, region))
            .transpose()?;

        let separator_marker = buffer.create_marker(
            RowRange::one_line(separator_row),
            InvalidationPolicy::Surround,
        )?;
        let separator = Separator::new(separator_marker);

        Ok(Some(Conflict::new(ours, theirs, base, separator)))
    }
}

impl ConflictVisitor for ConflictAssembler {
    fn visit_our_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        self.ours = Some(SideRegion {
            position,
            banner_row,
            text_start,
            text_end,
        });
    }

    fn visit_base_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        self.base = Some(SideRegion {
            position,
            banner_row,
            text_start,
            text_end,
        });
    }

    fn visit_their_side(
        &mut self,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        self.theirs = Some(SideRegion {
            position,
            banner_row,
            text_start,
            text_end,
        });
    }

    fn visit_separator(&mut self, row: usize) {
        self.separator_row = Some(row);
    }
}

fn build_side(
    buffer: &mut dyn MarkerBuffer,
    source: Source,
    region: SideRegion,
) -> Result<Side, BufferError> {
    let banner_range = RowRange::one_line(region.banner_row);
    let banner_text = buffer.text_in(banner_range)?;
    let description = banner_description(&banner_text);
    let banner_marker = buffer.create_marker(banner_range, InvalidationPolicy::Surround)?;
    let banner = Banner::new(banner_marker, description, banner_text);

    let body_range = RowRange::new(region.text_start, region.text_end);
    let body_text = buffer.text_in(body_range)?;
    let body_marker = buffer.create_marker(body_range, InvalidationPolicy::None)?;

    Ok(Side::new(source, region.position, banner, body_marker, body_text))
}

/// The text after the seven marker characters, e.g. `HEAD` or
/// `merged common ancestors`.
fn banner_description(banner_text: &str) -> String {
    banner_text
        .get(7..)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}
