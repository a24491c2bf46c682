//! Autocommit coordinator.
//!
//! Bridges fire-and-forget playback streams to the store's `commit`. Each
//! playback attempt registers under a fresh [`StreamId`]; when the stream
//! ends, whoever observes the terminal event calls [`AutocommitCoordinator::finalize`]
//! exactly once. The entry is removed by [`AutocommitCoordinator::take`]
//! before any decision is made, so a second finalize for the same id is a
//! structural no-op.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::CommitResult;
use crate::error::ReaderError;
use crate::ports::ReaderSessionPort;

/// Finalize details that mean "the listener did not hear the whole chunk".
pub const INTERRUPT_CAUSES: &[&str] = &[
    "playback_interrupted",
    "barge_in_triggered",
    "barge_in",
    "stream_cancelled",
    "superseded",
];

/// Returns true when `detail` names an interruption.
#[must_use]
pub fn is_interrupt_cause(detail: &str) -> bool {
    INTERRUPT_CAUSES.contains(&detail.trim())
}

/// Opaque identifier of one playback attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Mint a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for StreamId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to commit once a stream finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocommitEntry {
    pub session_id: String,
    pub chunk_id: String,
    pub chunk_index: usize,
    pub text_len: usize,
    pub start_offset_chars: usize,
    pub registered_at: DateTime<Utc>,
}

/// Result of [`AutocommitCoordinator::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// No entry for the stream id (never registered or already finalized).
    Unknown,
    /// The chunk was committed.
    Committed {
        session_id: String,
        result: CommitResult,
    },
    /// The chunk stays pending so the next delivery replays it.
    Held { session_id: String, detail: String },
    /// The store refused the commit (stale chunk id or missing session).
    CommitRejected { session_id: String, code: String },
}

/// Tracks registered playback streams and turns their endings into commits.
pub struct AutocommitCoordinator {
    store: Arc<dyn ReaderSessionPort>,
    entries: Mutex<HashMap<StreamId, AutocommitEntry>>,
}

impl AutocommitCoordinator {
    pub fn new(store: Arc<dyn ReaderSessionPort>) -> Self {
        Self {
            store,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a pending autocommit for `stream_id`, replacing any previous
    /// entry under the same id.
    pub fn register(
        &self,
        stream_id: StreamId,
        session_id: &str,
        chunk_id: &str,
        chunk_index: usize,
        text_len: usize,
        start_offset_chars: usize,
    ) {
        let entry = AutocommitEntry {
            session_id: session_id.to_string(),
            chunk_id: chunk_id.to_string(),
            chunk_index,
            text_len,
            start_offset_chars,
            registered_at: Utc::now(),
        };
        debug!(%stream_id, session_id, chunk_index, "Registered autocommit");
        self.lock().insert(stream_id, entry);
    }

    /// Remove and return the entry for `stream_id`.
    pub fn take(&self, stream_id: &StreamId) -> Option<AutocommitEntry> {
        self.lock().remove(stream_id)
    }

    /// Number of streams still awaiting finalize.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether `stream_id` is still registered.
    pub fn is_registered(&self, stream_id: &StreamId) -> bool {
        self.lock().contains_key(stream_id)
    }

    /// Resolve a stream ending into a commit or a hold.
    ///
    /// Interrupt causes always hold. Otherwise a successful stream commits,
    /// and a failed one commits only when `force_timeout_commit` is set.
    ///
    /// # Errors
    ///
    /// Only storage failures are returned; a rejected commit is reported as
    /// [`FinalizeOutcome::CommitRejected`].
    pub fn finalize(
        &self,
        stream_id: &StreamId,
        succeeded: bool,
        detail: &str,
        force_timeout_commit: bool,
    ) -> Result<FinalizeOutcome, ReaderError> {
        let Some(entry) = self.take(stream_id) else {
            debug!(%stream_id, detail, "Finalize for unknown stream ignored");
            return Ok(FinalizeOutcome::Unknown);
        };

        let should_commit =
            !is_interrupt_cause(detail) && (succeeded || force_timeout_commit);

        if !should_commit {
            warn!(
                %stream_id,
                session_id = %entry.session_id,
                chunk_index = entry.chunk_index,
                detail,
                "Autocommit held; chunk stays pending"
            );
            return Ok(FinalizeOutcome::Held {
                session_id: entry.session_id,
                detail: detail.to_string(),
            });
        }

        let reason = format!("autocommit:{}", detail.trim());
        match self.store.commit(
            &entry.session_id,
            &entry.chunk_id,
            Some(entry.chunk_index),
            Some(&reason),
        ) {
            Ok(result) => {
                info!(
                    %stream_id,
                    session_id = %entry.session_id,
                    chunk_index = entry.chunk_index,
                    cursor = result.cursor,
                    reason = %reason,
                    "Autocommitted chunk"
                );
                Ok(FinalizeOutcome::Committed {
                    session_id: entry.session_id,
                    result,
                })
            }
            Err(err) if err.is_caller_error() => {
                warn!(
                    %stream_id,
                    session_id = %entry.session_id,
                    error = %err,
                    "Autocommit rejected by store"
                );
                Ok(FinalizeOutcome::CommitRejected {
                    session_id: entry.session_id,
                    code: err.code().to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<StreamId, AutocommitEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for AutocommitCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutocommitCoordinator")
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
