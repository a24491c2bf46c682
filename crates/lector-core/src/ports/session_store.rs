//! Reader session store port.
//!
//! The store is the only component allowed to mutate a
//! [`SessionRecord`](crate::domain::SessionRecord). Each method is one atomic
//! transition: either the new state is durably persisted and returned, or the
//! call fails and nothing changed.
//!
//! The trait is synchronous. Every call is a short critical section with
//! bounded disk I/O, so async callers run it inline or via `spawn_blocking`.

use crate::domain::{
    BargeIn, BargeInResult, CommitResult, ModeResult, NextOutcome, RewindResult, RewindUnit,
    SeekOutcome, SessionSnapshot, StartResult,
};
use crate::error::ReaderError;

/// Parameters for creating (or resetting) a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSession {
    pub chunks: Vec<String>,
    /// Replace an existing record instead of returning it unchanged.
    pub reset: bool,
    pub book_id: Option<String>,
    /// Start with continuous mode enabled.
    pub continuous: bool,
}

impl NewSession {
    #[must_use]
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    #[must_use]
    pub fn book_id(mut self, book_id: impl Into<String>) -> Self {
        self.book_id = Some(book_id.into());
        self
    }

    #[must_use]
    pub const fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }
}

/// Durable reader session state.
pub trait ReaderSessionPort: Send + Sync {
    /// Create a session, or return the existing one untouched unless `reset`.
    fn start_session(
        &self,
        session_id: &str,
        chunks: Vec<String>,
        reset: bool,
    ) -> Result<StartResult, ReaderError> {
        self.start_session_with(session_id, NewSession::new(chunks).reset(reset))
    }

    /// Full form of [`Self::start_session`].
    fn start_session_with(
        &self,
        session_id: &str,
        params: NewSession,
    ) -> Result<StartResult, ReaderError>;

    /// Deliver the pending chunk again, or the chunk at the cursor.
    fn next_chunk(&self, session_id: &str) -> Result<NextOutcome, ReaderError>;

    /// Advance the cursor past the pending chunk if `chunk_id` matches it.
    fn commit(
        &self,
        session_id: &str,
        chunk_id: &str,
        chunk_index: Option<usize>,
        reason: Option<&str>,
    ) -> Result<CommitResult, ReaderError>;

    /// Record an interruption of the pending chunk.
    fn mark_barge_in(&self, session_id: &str, barge_in: BargeIn)
    -> Result<BargeInResult, ReaderError>;

    /// Jump to the first occurrence of `phrase` at or after the cursor.
    fn seek_phrase(&self, session_id: &str, phrase: &str) -> Result<SeekOutcome, ReaderError>;

    /// Move back by one unit from the current reading position.
    fn rewind(&self, session_id: &str, unit: RewindUnit) -> Result<RewindResult, ReaderError>;

    fn set_manual_mode(
        &self,
        session_id: &str,
        enabled: bool,
        reason: Option<&str>,
    ) -> Result<ModeResult, ReaderError>;

    fn set_continuous(
        &self,
        session_id: &str,
        enabled: bool,
        reason: Option<&str>,
    ) -> Result<ModeResult, ReaderError>;

    /// Read-only snapshot. `None` when the session does not exist.
    fn get_session(
        &self,
        session_id: &str,
        include_chunks: bool,
    ) -> Result<Option<SessionSnapshot>, ReaderError>;
}
