//! Reading session record and its sub-records.
//!
//! A [`SessionRecord`] is the persisted state of one reading session. It is
//! owned by the session store; everything else only ever sees snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the reader is in the speak / interrupt cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReaderState {
    /// Nothing is being delivered.
    #[default]
    Idle,
    /// A chunk was delivered and is (presumably) being spoken.
    Speaking,
    /// The listener barged in; the pending chunk is on hold.
    Commenting,
}

impl ReaderState {
    /// Stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Speaking => "speaking",
            Self::Commenting => "commenting",
        }
    }
}

/// The chunk most recently handed to a consumer but not yet committed.
///
/// Invariant: `chunk_index == cursor` of the owning record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChunk {
    /// Opaque token minted per delivery; commits must echo it back.
    pub chunk_id: String,
    pub chunk_index: usize,
    pub delivered_at: DateTime<Utc>,
    /// Character offset inside the chunk where the delivered text starts.
    #[serde(default)]
    pub start_offset_chars: usize,
}

/// Sub-chunk resume point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub chunk_index: usize,
    pub offset_chars: usize,
}

/// Persisted state for one reading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub book_id: Option<String>,
    pub chunks: Vec<String>,
    /// Number of chunks fully committed; `chunks[..cursor]` are done.
    pub cursor: usize,
    #[serde(default)]
    pub pending: Option<PendingChunk>,
    #[serde(default)]
    pub bookmark: Option<Bookmark>,
    #[serde(default)]
    pub manual_mode: bool,
    #[serde(default)]
    pub continuous_enabled: bool,
    #[serde(default)]
    pub continuous_active: bool,
    #[serde(default)]
    pub continuous_reason: Option<String>,
    #[serde(default)]
    pub barge_in_count: u64,
    #[serde(default)]
    pub reader_state: ReaderState,
    #[serde(default)]
    pub last_commit_reason: Option<String>,
    #[serde(default)]
    pub last_barge_in_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Fresh record positioned at the first chunk.
    #[must_use]
    pub fn new(session_id: impl Into<String>, chunks: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            book_id: None,
            chunks,
            cursor: 0,
            pending: None,
            bookmark: None,
            manual_mode: false,
            continuous_enabled: false,
            continuous_active: false,
            continuous_reason: None,
            barge_in_count: 0,
            reader_state: ReaderState::Idle,
            last_commit_reason: None,
            last_barge_in_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// True once every chunk has been committed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.chunks.len()
    }

    /// Bookmark offset that applies to the chunk at the cursor, if any.
    #[must_use]
    pub fn resume_offset(&self) -> usize {
        match self.bookmark {
            Some(bm) if bm.chunk_index == self.cursor => bm.offset_chars,
            _ => 0,
        }
    }

    /// Read-only view handed to callers.
    #[must_use]
    pub fn snapshot(&self, include_chunks: bool) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            book_id: self.book_id.clone(),
            total_chunks: self.total_chunks(),
            cursor: self.cursor,
            done: self.is_done(),
            pending: self.pending.clone(),
            bookmark: self.bookmark,
            manual_mode: self.manual_mode,
            continuous_enabled: self.continuous_enabled,
            continuous_active: self.continuous_active,
            continuous_reason: self.continuous_reason.clone(),
            barge_in_count: self.barge_in_count,
            reader_state: self.reader_state,
            last_commit_reason: self.last_commit_reason.clone(),
            last_barge_in_detail: self.last_barge_in_detail.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            chunks: include_chunks.then(|| self.chunks.clone()),
        }
    }
}

/// Copy of a session for status and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub book_id: Option<String>,
    pub total_chunks: usize,
    pub cursor: usize,
    pub done: bool,
    pub pending: Option<PendingChunk>,
    pub bookmark: Option<Bookmark>,
    pub manual_mode: bool,
    pub continuous_enabled: bool,
    pub continuous_active: bool,
    pub continuous_reason: Option<String>,
    pub barge_in_count: u64,
    pub reader_state: ReaderState,
    pub last_commit_reason: Option<String>,
    pub last_barge_in_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(chunks: &[&str]) -> SessionRecord {
        SessionRecord::new(
            "s",
            chunks.iter().map(ToString::to_string).collect(),
            Utc::now(),
        )
    }

    #[test]
    fn resume_offset_only_applies_at_cursor() {
        let mut rec = record(&["uno", "dos"]);
        rec.bookmark = Some(Bookmark {
            chunk_index: 1,
            offset_chars: 2,
        });
        assert_eq!(rec.resume_offset(), 0);

        rec.cursor = 1;
        assert_eq!(rec.resume_offset(), 2);
    }

    #[test]
    fn snapshot_omits_chunks_unless_asked() {
        let rec = record(&["uno"]);
        assert!(rec.snapshot(false).chunks.is_none());
        assert_eq!(rec.snapshot(true).chunks.unwrap(), vec!["uno".to_string()]);
    }

    #[test]
    fn reader_state_serializes_lowercase() {
        let json = serde_json::to_string(&ReaderState::Commenting).unwrap();
        assert_eq!(json, "\"commenting\"");
    }

    #[test]
    fn legacy_record_without_optional_fields_deserializes() {
        let json = r#"{
            "session_id": "s",
            "chunks": ["a"],
            "cursor": 0,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        }"#;
        let rec: SessionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.reader_state, ReaderState::Idle);
        assert!(rec.pending.is_none());
    }
}
