//! Typed results for each reader session operation.
//!
//! Every store transition returns one of these instead of a loose map, so a
//! caller can't observe e.g. `committed = true` without a cursor.

use serde::{Deserialize, Serialize};

use super::session::{Bookmark, ReaderState};

/// Result of `start_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResult {
    pub session_id: String,
    /// False when an existing record was kept as-is.
    pub started: bool,
    pub total_chunks: usize,
    pub cursor: usize,
}

/// The chunk handed to a consumer by `next_chunk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredChunk {
    pub chunk_id: String,
    pub chunk_index: usize,
    /// Text to speak, starting at `offset_chars` within the stored chunk.
    pub text: String,
    pub offset_chars: usize,
    pub total_chunks: usize,
}

/// Result of `next_chunk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextOutcome {
    Delivered {
        chunk: DeliveredChunk,
        /// True when the pending chunk was returned again.
        replayed: bool,
        cursor: usize,
    },
    EndOfBook {
        cursor: usize,
        total_chunks: usize,
    },
}

impl NextOutcome {
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::EndOfBook { .. })
    }

    #[must_use]
    pub const fn chunk(&self) -> Option<&DeliveredChunk> {
        match self {
            Self::Delivered { chunk, .. } => Some(chunk),
            Self::EndOfBook { .. } => None,
        }
    }
}

/// Result of a successful `commit`. Mismatches are errors, not outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub committed_index: usize,
    pub cursor: usize,
    pub total_chunks: usize,
    pub done: bool,
    pub continuous_active: bool,
}

/// Input for `mark_barge_in`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BargeIn {
    pub detail: String,
    pub playback_ms: Option<u64>,
    /// Listener explicitly asked to stop; pauses continuous mode too.
    #[serde(default)]
    pub user_interrupt: bool,
}

/// Result of `mark_barge_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BargeInResult {
    /// False when nothing was pending, in which case nothing changed.
    pub interrupted: bool,
    pub barge_in_count: u64,
    pub cursor: usize,
    pub bookmark: Option<Bookmark>,
    pub reader_state: ReaderState,
}

/// Result of `seek_phrase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekOutcome {
    Found {
        chunk_index: usize,
        offset_chars: usize,
        /// Chunk text trimmed to start at the matched phrase.
        text: String,
    },
    NotFound,
}

/// Granularity for `rewind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewindUnit {
    Sentence,
    Paragraph,
    Chunk,
}

impl RewindUnit {
    /// Parse a wire label; accepts a few spoken synonyms.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sentence" | "frase" | "oracion" => Some(Self::Sentence),
            "paragraph" | "parrafo" => Some(Self::Paragraph),
            "chunk" | "bloque" => Some(Self::Chunk),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sentence => "sentence",
            Self::Paragraph => "paragraph",
            Self::Chunk => "chunk",
        }
    }
}

/// Result of `rewind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewindResult {
    pub unit: RewindUnit,
    /// False when already at the very beginning of the book.
    pub rewound: bool,
    pub cursor: usize,
    pub bookmark: Option<Bookmark>,
}

/// Result of the manual / continuous toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResult {
    pub manual_mode: bool,
    pub continuous_enabled: bool,
    pub continuous_active: bool,
    pub continuous_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewind_unit_parses_synonyms() {
        assert_eq!(RewindUnit::parse(" Sentence "), Some(RewindUnit::Sentence));
        assert_eq!(RewindUnit::parse("parrafo"), Some(RewindUnit::Paragraph));
        assert_eq!(RewindUnit::parse("chunk"), Some(RewindUnit::Chunk));
        assert_eq!(RewindUnit::parse("page"), None);
    }

    #[test]
    fn end_of_book_has_no_chunk() {
        let outcome = NextOutcome::EndOfBook {
            cursor: 2,
            total_chunks: 2,
        };
        assert!(outcome.is_done());
        assert!(outcome.chunk().is_none());
    }
}
