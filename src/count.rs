//! Conflict counting over streamed text.
//!
//! [`StreamCounter`] accepts arbitrarily chunked text and counts completed
//! conflicts without building any model objects. A conflict split across a
//! chunk boundary is held as a [`Continuation`] and finished on the next
//! chunk; a boundary line severed mid-marker is carried forward verbatim so
//! no chunking of the same text can change the count.

use std::mem;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::errors::StreamError;
use crate::parse::cursor::{ChunkCursor, CONFLICT_START};
use crate::parse::machine::{ConflictParser, Continuation, ParseOutcome};
use crate::parse::visitor::NoopVisitor;

/// Incremental conflict counter.
#[derive(Debug, Default)]
pub struct StreamCounter {
    is_rebase: bool,
    count: usize,
    /// Possible partial marker line severed by the last chunk boundary.
    carry: String,
    /// A conflict the last chunk left half-recognized.
    pending: Option<Continuation>,
}

impl StreamCounter {
    pub fn new(is_rebase: bool) -> Self {
        Self {
            is_rebase,
            ..Self::default()
        }
    }

    /// Completed conflicts seen so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Feed the next chunk of text.
    pub fn feed(&mut self, chunk: &str) {
        let mut data = mem::take(&mut self.carry);
        data.push_str(chunk);
        let mut cursor = ChunkCursor::new(&data);

        if let Some(continuation) = self.pending.take() {
            let mut noop = NoopVisitor;
            match ConflictParser::resume(&mut cursor, &mut noop, continuation).parse() {
                ParseOutcome::Complete => self.count += 1,
                ParseOutcome::Incomplete(c) => {
                    self.pending = Some(c);
                    self.carry = cursor.last_partial_marker().to_string();
                    return;
                }
            }
        }

        while cursor.advance_to(&CONFLICT_START) {
            let mut noop = NoopVisitor;
            match ConflictParser::new(&mut cursor, &mut noop, self.is_rebase).parse() {
                ParseOutcome::Complete => self.count += 1,
                ParseOutcome::Incomplete(c) => {
                    self.pending = Some(c);
                    break;
                }
            }
        }

        self.carry = cursor.last_partial_marker().to_string();
    }

    /// Final count. A conflict still unterminated at end of input does not
    /// count.
    pub fn finish(mut self) -> usize {
        // End of input terminates a final line that never got a newline.
        // The carry holds any marker-like tail, so one synthetic terminator
        // lets it classify the same way a buffer parse would.
        if !self.carry.is_empty() {
            self.feed("\n");
        }
        if self.pending.is_some() {
            debug!("input ended inside an unterminated conflict");
        }
        self.count
    }
}

/// Count conflicts in an async byte stream.
pub async fn count_from_reader<R>(reader: R, is_rebase: bool) -> Result<usize, StreamError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut counter = StreamCounter::new(is_rebase);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        counter.feed(&line);
    }
    Ok(counter.finish())
}
