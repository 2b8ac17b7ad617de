//! The resumable conflict state machine.
//!
//! A conflict parse is a queue of [`Step`]s executed front to back. Each
//! step carries its own progress, so when input runs out mid-step the whole
//! queue serializes into a [`Continuation`] and a later parse picks up at
//! the exact line where this one stalled, never replaying or skipping
//! input. Nested conflicts inside a diff3 BASE region are skipped with a
//! fresh recognition-only parse, whose own continuation nests inside the
//! outer one.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::model::{Position, Source};

use super::boundary::{advance_to_boundary, Boundary};
use super::cursor::LineCursor;
use super::visitor::{ConflictVisitor, NoopVisitor};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One stage of recognizing a conflict, with its resume state inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A side introduced by a banner above its text (`<<<<<<<`).
    HeaderSide {
        source: Source,
        position: Position,
        banner_row: Option<usize>,
        banner_consumed: bool,
    },
    /// The optional `|||||||` base region, then the `=======` separator.
    BaseAndSeparator { phase: BasePhase },
    /// A side closed by a banner below its text (`>>>>>>>`).
    FooterSide {
        source: Source,
        position: Position,
        text_start: Option<usize>,
    },
}

/// Progress through the base-and-separator step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasePhase {
    NotStarted,
    /// Inside a `|||||||` region, possibly partway through skipping a
    /// nested conflict.
    ScanningBase {
        banner_row: Option<usize>,
        nested: Option<Box<Continuation>>,
    },
    /// The separator is the current line.
    AwaitSeparator,
}

/// A stalled parse, serializable for storage between chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    steps: Vec<Step>,
    last_boundary: Option<Boundary>,
}

/// Result of driving the machine over one stretch of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The closing banner was recognized.
    Complete,
    /// Input ran out first; resume with the continuation on more input.
    Incomplete(Continuation),
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Drives the step queue over a cursor, reporting regions to a visitor.
pub struct ConflictParser<'a, C, V> {
    cursor: &'a mut C,
    visitor: &'a mut V,
    steps: VecDeque<Step>,
    last_boundary: Option<Boundary>,
}

impl<'a, C: LineCursor, V: ConflictVisitor> ConflictParser<'a, C, V> {
    /// Start a parse with the cursor on a `<<<<<<<` banner line.
    ///
    /// During a rebase the sources flip: the top side is THEIRS and the
    /// bottom side is OURS.
    pub fn new(cursor: &'a mut C, visitor: &'a mut V, is_rebase: bool) -> Self {
        let (top, bottom) = if is_rebase {
            (Source::Theirs, Source::Ours)
        } else {
            (Source::Ours, Source::Theirs)
        };
        let steps = VecDeque::from([
            Step::HeaderSide {
                source: top,
                position: Position::Top,
                banner_row: None,
                banner_consumed: false,
            },
            Step::BaseAndSeparator {
                phase: BasePhase::NotStarted,
            },
            Step::FooterSide {
                source: bottom,
                position: Position::Bottom,
                text_start: None,
            },
        ]);
        Self {
            cursor,
            visitor,
            steps,
            last_boundary: None,
        }
    }

    /// Pick a stalled parse back up on fresh input.
    pub fn resume(cursor: &'a mut C, visitor: &'a mut V, continuation: Continuation) -> Self {
        Self {
            cursor,
            visitor,
            steps: continuation.steps.into(),
            last_boundary: continuation.last_boundary,
        }
    }

    /// Run steps until the conflict completes or input runs out.
    pub fn parse(mut self) -> ParseOutcome {
        while let Some(step) = self.steps.pop_front() {
            trace!(?step, "running parse step");
            if let Err(stalled) = self.run_step(step) {
                self.steps.push_front(stalled);
                return ParseOutcome::Incomplete(Continuation {
                    steps: self.steps.into(),
                    last_boundary: self.last_boundary,
                });
            }
        }
        ParseOutcome::Complete
    }

    /// Execute one step; `Err` returns the step, updated, to stall on.
    fn run_step(&mut self, step: Step) -> Result<(), Step> {
        match step {
            Step::HeaderSide {
                source,
                position,
                banner_row,
                banner_consumed,
            } => self.header_side(source, position, banner_row, banner_consumed),
            Step::BaseAndSeparator { phase } => self.base_and_separator(phase),
            Step::FooterSide {
                source,
                position,
                text_start,
            } => self.footer_side(source, position, text_start),
        }
    }

    fn header_side(
        &mut self,
        source: Source,
        position: Position,
        mut banner_row: Option<usize>,
        mut banner_consumed: bool,
    ) -> Result<(), Step> {
        if !banner_consumed {
            if self.cursor.at_end() {
                return Err(Step::HeaderSide {
                    source,
                    position,
                    banner_row,
                    banner_consumed,
                });
            }
            banner_row = self.cursor.current_row();
            self.cursor.advance();
            banner_consumed = true;
        }

        // Side text runs until the base banner or the separator. A nested
        // `<<<<<<<` here is ordinary text.
        let Some(found) = advance_to_boundary(self.cursor, &[Boundary::Base, Boundary::Separator])
        else {
            return Err(Step::HeaderSide {
                source,
                position,
                banner_row,
                banner_consumed,
            });
        };
        self.last_boundary = Some(found);

        let banner = banner_row.unwrap_or(0);
        let text_end = self.row();
        self.visit_side(source, position, banner, banner + 1, text_end);
        Ok(())
    }

    fn base_and_separator(&mut self, mut phase: BasePhase) -> Result<(), Step> {
        if matches!(phase, BasePhase::NotStarted) {
            phase = if self.last_boundary == Some(Boundary::Base) {
                let banner_row = self.cursor.current_row();
                self.cursor.advance();
                BasePhase::ScanningBase {
                    banner_row,
                    nested: None,
                }
            } else {
                BasePhase::AwaitSeparator
            };
        }

        if let BasePhase::ScanningBase {
            banner_row,
            mut nested,
        } = phase
        {
            loop {
                // Finish skipping a nested conflict a previous chunk left
                // half-recognized.
                if let Some(continuation) = nested.take() {
                    match resume_skip(self.cursor, *continuation) {
                        ParseOutcome::Complete => {}
                        ParseOutcome::Incomplete(c) => {
                            return Err(Step::BaseAndSeparator {
                                phase: BasePhase::ScanningBase {
                                    banner_row,
                                    nested: Some(Box::new(c)),
                                },
                            });
                        }
                    }
                }

                match advance_to_boundary(self.cursor, &[Boundary::Ours, Boundary::Separator]) {
                    None => {
                        return Err(Step::BaseAndSeparator {
                            phase: BasePhase::ScanningBase {
                                banner_row,
                                nested: None,
                            },
                        });
                    }
                    Some(Boundary::Ours) => {
                        // A criss-cross merge nests a whole conflict inside
                        // the base region. Recognize and discard it.
                        match skip_nested(self.cursor) {
                            ParseOutcome::Complete => {}
                            ParseOutcome::Incomplete(c) => {
                                return Err(Step::BaseAndSeparator {
                                    phase: BasePhase::ScanningBase {
                                        banner_row,
                                        nested: Some(Box::new(c)),
                                    },
                                });
                            }
                        }
                    }
                    Some(_) => {
                        let banner = banner_row.unwrap_or(0);
                        let text_end = self.row();
                        self.visit_side(
                            Source::Base,
                            Position::Middle,
                            banner,
                            banner + 1,
                            text_end,
                        );
                        break;
                    }
                }
            }
        }

        // The separator is now the current line.
        self.visitor.visit_separator(self.row());
        self.cursor.advance();
        self.last_boundary = Some(Boundary::Separator);
        Ok(())
    }

    fn footer_side(
        &mut self,
        source: Source,
        position: Position,
        mut text_start: Option<usize>,
    ) -> Result<(), Step> {
        if text_start.is_none() {
            text_start = self.cursor.current_row();
        }

        let Some(_) = advance_to_boundary(self.cursor, &[Boundary::Theirs]) else {
            return Err(Step::FooterSide {
                source,
                position,
                text_start,
            });
        };

        let banner_row = self.row();
        self.visit_side(source, position, banner_row, text_start.unwrap_or(0), banner_row);
        self.cursor.advance();
        self.last_boundary = Some(Boundary::Theirs);
        Ok(())
    }

    fn visit_side(
        &mut self,
        source: Source,
        position: Position,
        banner_row: usize,
        text_start: usize,
        text_end: usize,
    ) {
        match source {
            Source::Ours => self
                .visitor
                .visit_our_side(position, banner_row, text_start, text_end),
            Source::Base => self
                .visitor
                .visit_base_side(position, banner_row, text_start, text_end),
            Source::Theirs => self
                .visitor
                .visit_their_side(position, banner_row, text_start, text_end),
        }
    }

    /// The current row, or zero in chunk mode where rows are placeholders.
    fn row(&self) -> usize {
        self.cursor.current_row().unwrap_or(0)
    }
}

/// Recognize and discard one nested conflict, cursor on its `<<<<<<<`.
fn skip_nested<C: LineCursor>(cursor: &mut C) -> ParseOutcome {
    let mut noop = NoopVisitor;
    ConflictParser::new(cursor, &mut noop, false).parse()
}

fn resume_skip<C: LineCursor>(cursor: &mut C, continuation: Continuation) -> ParseOutcome {
    let mut noop = NoopVisitor;
    ConflictParser::resume(cursor, &mut noop, continuation).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::cursor::ChunkCursor;

    fn recognize(text: &str) -> ParseOutcome {
        let mut cursor = ChunkCursor::new(text);
        let mut noop = NoopVisitor;
        ConflictParser::new(&mut cursor, &mut noop, false).parse()
    }

    #[test]
    fn test_two_way_conflict_completes() {
        let outcome = recognize("<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> other\n");
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_three_way_conflict_completes() {
        let outcome = recognize(
            "<<<<<<< HEAD\nmine\n||||||| merged common ancestors\nold\n=======\nyours\n>>>>>>> other\n",
        );
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_nested_conflict_in_base_is_skipped() {
        let outcome = recognize(concat!(
            "<<<<<<< HEAD\n",
            "mine\n",
            "||||||| merged common ancestors\n",
            "<<<<<<< temporary branch 1\n",
            "nested a\n",
            "=======\n",
            "nested b\n",
            ">>>>>>> temporary branch 2\n",
            "old\n",
            "=======\n",
            "yours\n",
            ">>>>>>> other\n",
        ));
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_missing_footer_stalls() {
        let outcome = recognize("<<<<<<< HEAD\nmine\n=======\nyours\n");
        assert!(matches!(outcome, ParseOutcome::Incomplete(_)));
    }

    #[test]
    fn test_resume_across_split_does_not_replay() {
        let whole = "<<<<<<< HEAD\nmine\n=======\nyours\n>>>>>>> other\n";
        for split in 1..whole.len() {
            let (head, tail) = whole.split_at(split);
            // Only feed whole lines; a severed line carries over as text.
            let head_complete = &head[..head.rfind('\n').map_or(0, |i| i + 1)];
            let carry = &head[head_complete.len()..];

            let mut cursor = ChunkCursor::new(head_complete);
            let mut noop = NoopVisitor;
            let outcome = ConflictParser::new(&mut cursor, &mut noop, false).parse();

            match outcome {
                ParseOutcome::Complete => {
                    assert!(carry.is_empty() && tail.is_empty());
                }
                ParseOutcome::Incomplete(continuation) => {
                    let rest = format!("{carry}{tail}");
                    let mut cursor = ChunkCursor::new(&rest);
                    let mut noop = NoopVisitor;
                    let resumed =
                        ConflictParser::resume(&mut cursor, &mut noop, continuation).parse();
                    assert!(resumed.is_complete(), "split at {split} failed to resume");
                }
            }
        }
    }

    #[test]
    fn test_continuation_round_trips_through_serde() {
        let ParseOutcome::Incomplete(continuation) =
            recognize("<<<<<<< HEAD\nmine\n||||||| base\nold\n")
        else {
            panic!("expected a stalled parse");
        };
        let json = serde_json::to_string(&continuation).unwrap();
        let restored: Continuation = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, continuation);
    }
}
