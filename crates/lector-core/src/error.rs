//! Error taxonomy for reader operations.
//!
//! Caller errors carry a stable wire code (see [`ReaderError::code`]) that
//! adapters put in the `error` field of their responses. Infrastructure
//! failures are wrapped in [`StorageError`] and always fail the whole
//! operation without touching durable state.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the persistence layer (state file, lock file, library index).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Advisory lock could not be acquired.
    #[error("Failed to lock {path}: {reason}")]
    Lock { path: PathBuf, reason: String },

    /// State file content could not be encoded or decoded.
    #[error("Invalid JSON in {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State file was written by a newer format.
    #[error("Unsupported state version {found} in {path}")]
    UnsupportedVersion { path: PathBuf, found: u32 },
}

impl StorageError {
    /// Shorthand for the `Io` variant.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by reader session and library operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// No record exists for the session id.
    #[error("Reader session '{0}' not found")]
    SessionNotFound(String),

    /// Commit did not target the currently pending chunk.
    #[error("Commit does not match pending chunk (expected {expected:?}, got {got})")]
    CommitChunkMismatch {
        expected: Option<String>,
        got: String,
    },

    /// `start_session` was called without any chunks.
    #[error("Chunk list is empty")]
    ChunksEmpty,

    /// `seek_phrase` was called with a blank phrase.
    #[error("Seek phrase is empty")]
    SeekPhraseEmpty,

    /// Unknown `book_id`.
    #[error("Book '{0}' not found in library")]
    BookNotFound(String),

    /// Unknown rewind unit.
    #[error("Invalid rewind unit '{0}'")]
    InvalidUnit(String),

    /// Durable storage failed; no state was changed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ReaderError {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "reader_session_not_found",
            Self::CommitChunkMismatch { .. } => "reader_commit_chunk_mismatch",
            Self::ChunksEmpty => "reader_chunks_empty",
            Self::SeekPhraseEmpty => "reader_seek_phrase_empty",
            Self::BookNotFound(_) => "reader_book_not_found",
            Self::InvalidUnit(_) => "reader_invalid_unit",
            Self::Storage(_) => "reader_storage_failure",
        }
    }

    /// True for errors caused by the caller's input rather than the environment.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = ReaderError::CommitChunkMismatch {
            expected: Some("chunk_0_ab".into()),
            got: "chunk_0_cd".into(),
        };
        assert_eq!(err.code(), "reader_commit_chunk_mismatch");
        assert!(err.is_caller_error());

        let storage = ReaderError::from(StorageError::Lock {
            path: PathBuf::from("/tmp/x.lock"),
            reason: "busy".into(),
        });
        assert_eq!(storage.code(), "reader_storage_failure");
        assert!(!storage.is_caller_error());
    }
}
