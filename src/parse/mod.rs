//! Conflict recognition: cursors, boundary classification, the resumable
//! state machine, and visitor strategies.

pub mod boundary;
pub mod cursor;
pub mod machine;
pub mod visitor;

use tracing::{debug, info};

use crate::buffer::MarkerBuffer;
use crate::errors::BufferError;
use crate::model::Conflict;

use cursor::{BufferCursor, CONFLICT_START};
use machine::{ConflictParser, ParseOutcome};
use visitor::ConflictAssembler;

/// Scan a whole buffer and materialize every well-formed conflict.
///
/// Candidate `<<<<<<< ` lines that do not parse through to a closing banner
/// leave no markers behind, and scanning continues just past them, so a
/// corrupted conflict never hides a later valid one.
pub fn parse_all(
    buffer: &mut dyn MarkerBuffer,
    is_rebase: bool,
) -> Result<Vec<Conflict>, BufferError> {
    let mut conflicts = Vec::new();
    let mut row = 0;

    while row < buffer.line_count() {
        let Some(line) = buffer.line(row) else { break };
        if !CONFLICT_START.is_match(line) {
            row += 1;
            continue;
        }

        let start_row = row;
        let mut assembler = ConflictAssembler::new();
        let consumed = {
            let mut cursor = BufferCursor::new(&*buffer, start_row);
            let outcome = ConflictParser::new(&mut cursor, &mut assembler, is_rebase).parse();
            match outcome {
                ParseOutcome::Complete => None,
                ParseOutcome::Incomplete(_) => Some(cursor.row()),
            }
        };

        match consumed {
            None => {
                let end_row = assembler.end_row();
                if let Some(conflict) = assembler.materialize(buffer)? {
                    conflicts.push(conflict);
                }
                row = end_row.unwrap_or(start_row + 1).max(start_row + 1);
            }
            Some(stalled_at) => {
                debug!(start_row, "conflict candidate never closed; skipping");
                row = stalled_at.max(start_row + 1);
            }
        }
    }

    info!(count = conflicts.len(), is_rebase, "buffer parsed");
    Ok(conflicts)
}
