//! Recognition and resolution of Git merge-conflict markers.
//!
//! The engine parses conflict regions (`<<<<<<<` / `|||||||` / `=======` /
//! `>>>>>>>`) out of a host text buffer, tracks each region with markers the
//! buffer keeps in place across edits, and applies resolutions as atomic
//! buffer transactions. Both classic 2-way and diff3 3-way conflicts are
//! handled, including criss-cross merges that nest whole conflicts inside a
//! base region, and rebase conflicts where the top side carries THEIRS.
//!
//! Two entry points cover the two consumption modes:
//!
//! - [`parse_all`] walks a [`MarkerBuffer`] and materializes [`Conflict`]
//!   values with live markers, ready for [`Conflict::resolve_as`].
//! - [`StreamCounter`] and [`count_from_reader`] count conflicts in
//!   arbitrarily chunked streaming text without building any model objects,
//!   with a guaranteed chunking-independent result for line-aligned feeds.

pub mod buffer;
pub mod count;
pub mod errors;
pub mod model;
pub mod parse;
pub mod progress;

pub use buffer::{InvalidationPolicy, MarkerBuffer, MemoryBuffer, Point, RangeHandle, RowRange};
pub use count::{count_from_reader, StreamCounter};
pub use errors::{BufferError, EngineError, StreamError};
pub use model::{Banner, Conflict, Position, Separator, Side, SideKind, Source};
pub use parse::parse_all;
pub use progress::{ResolutionProgress, SubscriptionId};
