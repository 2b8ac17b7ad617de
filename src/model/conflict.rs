//! The conflict aggregate and the resolution algorithm.
//!
//! Resolution computes the edits a chosen sequence of sources requires and
//! issues them against the host buffer inside one transaction: concatenate
//! the requested side texts in caller order onto the first side, reposition
//! the marker that follows it, delete the chosen side's banner and the
//! separator when unmodified, and unconditionally delete every unchosen
//! side.

use tracing::{debug, info};

use crate::buffer::{MarkerBuffer, Point, RangeHandle, RowRange};
use crate::errors::BufferError;

use super::regions::{Separator, Side};
use super::{Position, Source};

/// One parsed conflict region and its resolution state.
#[derive(Debug)]
pub struct Conflict {
    ours: Side,
    theirs: Side,
    base: Option<Side>,
    separator: Separator,
    resolution: Option<Source>,
}

impl Conflict {
    pub(crate) fn new(ours: Side, theirs: Side, base: Option<Side>, separator: Separator) -> Self {
        Self {
            ours,
            theirs,
            base,
            separator,
            resolution: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// All sides, ordered top to bottom.
    pub fn sides(&self) -> Vec<&Side> {
        let mut sides: Vec<&Side> = Vec::with_capacity(3);
        for position in [Position::Top, Position::Middle, Position::Bottom] {
            if let Some(side) = self.side_at(position) {
                sides.push(side);
            }
        }
        sides
    }

    pub fn side(&self, source: Source) -> Option<&Side> {
        match source {
            Source::Ours => Some(&self.ours),
            Source::Theirs => Some(&self.theirs),
            Source::Base => self.base.as_ref(),
        }
    }

    pub fn side_at(&self, position: Position) -> Option<&Side> {
        [Some(&self.ours), Some(&self.theirs), self.base.as_ref()]
            .into_iter()
            .flatten()
            .find(|side| side.position() == position)
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// The conflict's overall extent: the union of its topmost and
    /// bottommost side ranges.
    pub fn range(&self, buffer: &dyn MarkerBuffer) -> Result<RowRange, BufferError> {
        let mut range: Option<RowRange> = None;
        for side in self.sides() {
            let side_range = side.full_range(buffer)?;
            range = Some(match range {
                Some(r) => r.union(side_range),
                None => side_range,
            });
        }
        // At least OURS and THEIRS always exist.
        Ok(range.unwrap_or(RowRange::new(0, 0)))
    }

    pub fn includes_point(
        &self,
        buffer: &dyn MarkerBuffer,
        point: Point,
    ) -> Result<bool, BufferError> {
        Ok(self.range(buffer)?.contains_row(point.row))
    }

    /// The side whose banner or body covers `point`, if any.
    pub fn side_containing(
        &self,
        buffer: &dyn MarkerBuffer,
        point: Point,
    ) -> Result<Option<&Side>, BufferError> {
        for side in self.sides() {
            if side.full_range(buffer)?.contains_row(point.row) {
                return Ok(Some(side));
            }
        }
        Ok(None)
    }

    // -----------------------------------------------------------------------
    // Resolution state
    // -----------------------------------------------------------------------

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn chosen_side(&self) -> Option<&Side> {
        self.resolution.and_then(|source| self.side(source))
    }

    /// Every side except the chosen one (all sides while unresolved).
    pub fn unchosen_sides(&self) -> Vec<&Side> {
        self.sides()
            .into_iter()
            .filter(|side| Some(side.source()) != self.resolution)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve by keeping a single source's text.
    pub fn resolve_as(
        &mut self,
        buffer: &mut dyn MarkerBuffer,
        source: Source,
    ) -> Result<(), BufferError> {
        self.resolve_as_sequence(buffer, &[source])
    }

    /// Resolve by keeping several sources' texts, concatenated in the given
    /// order.
    ///
    /// Sources absent from this conflict (BASE in a 2-way conflict) are
    /// filtered out. An empty or all-absent sequence is a no-op: the
    /// conflict stays unresolved and no edits are issued.
    pub fn resolve_as_sequence(
        &mut self,
        buffer: &mut dyn MarkerBuffer,
        sources: &[Source],
    ) -> Result<(), BufferError> {
        let present: Vec<Source> = sources
            .iter()
            .copied()
            .filter(|source| self.side(*source).is_some())
            .collect();
        let Some(&chosen) = present.first() else {
            debug!("resolution requested with no present sources; ignoring");
            return Ok(());
        };
        let Some(first_side) = self.side(chosen) else {
            return Ok(());
        };

        buffer.transact(&mut |buf| {
            // Concatenate the remaining sides' text onto the first, in the
            // caller's order, then keep the first side's marker and the
            // marker following it from absorbing each other.
            if present.len() > 1 {
                let mut combined = buf.text_in(buf.marker_range(first_side.marker())?)?;
                if !combined.is_empty() && !combined.ends_with('\n') {
                    combined.push('\n');
                }
                for source in &present[1..] {
                    if let Some(side) = self.side(*source) {
                        combined.push_str(&side.text(buf)?);
                    }
                }

                let first_range = buf.marker_range(first_side.marker())?;
                let combined_rows = combined.split_inclusive('\n').count();
                buf.set_text(first_range, &combined)?;

                let new_range = RowRange::new(first_range.start, first_range.start + combined_rows);
                buf.set_marker_range(first_side.marker(), new_range)?;

                let following = self.marker_following(first_side);
                let following_range = buf.marker_range(following)?;
                buf.set_marker_range(
                    following,
                    RowRange::new(new_range.end, following_range.end.max(new_range.end)),
                )?;
            }

            // The chosen side keeps its banner and the separator only if the
            // user edited them.
            if !first_side.banner().is_modified(buf)? {
                let range = buf.marker_range(first_side.banner().marker())?;
                buf.set_text(range, "")?;
            }
            if !self.separator.is_modified(buf)? {
                let range = buf.marker_range(self.separator.marker())?;
                buf.set_text(range, "")?;
            }

            // Unchosen sides are deleted wholesale, banner and body.
            for side in self.sides() {
                if side.source() == chosen {
                    continue;
                }
                let banner_range = buf.marker_range(side.banner().marker())?;
                buf.set_text(banner_range, "")?;
                let body_range = buf.marker_range(side.marker())?;
                buf.set_text(body_range, "")?;
            }

            Ok(())
        })?;

        self.resolution = Some(chosen);
        info!(source = %chosen, "conflict resolved");
        Ok(())
    }

    /// The marker immediately below the given side's body: the base banner
    /// or separator for the top side, the separator for the middle side,
    /// and the side's own (footer) banner for the bottom side.
    fn marker_following(&self, side: &Side) -> RangeHandle {
        match side.position() {
            Position::Top => match &self.base {
                Some(base) => base.banner().marker(),
                None => self.separator.marker(),
            },
            Position::Middle => self.separator.marker(),
            Position::Bottom => side.banner().marker(),
        }
    }

    /// Release every tracked range without resolving. Used when the user
    /// elects to edit the conflict by hand.
    pub fn dismiss(self, buffer: &mut dyn MarkerBuffer) -> Result<(), BufferError> {
        for side in [Some(&self.ours), self.base.as_ref(), Some(&self.theirs)]
            .into_iter()
            .flatten()
        {
            buffer.destroy_marker(side.banner().marker())?;
            buffer.destroy_marker(side.marker())?;
        }
        buffer.destroy_marker(self.separator.marker())?;
        Ok(())
    }
}
