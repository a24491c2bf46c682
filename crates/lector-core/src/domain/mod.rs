//! Domain types for reader sessions and the book library.

mod book;
mod outcome;
mod session;

pub use book::{BookEntry, BookFormat, book_id_for};
pub use outcome::{
    BargeIn, BargeInResult, CommitResult, DeliveredChunk, ModeResult, NextOutcome, RewindResult,
    RewindUnit, SeekOutcome, StartResult,
};
pub use session::{Bookmark, PendingChunk, ReaderState, SessionRecord, SessionSnapshot};
