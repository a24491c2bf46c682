//! Axum-specific error types and mappings.
//!
//! Every failure is rendered as `{ "ok": false, "error": <code>, "detail": <message> }`.
//! Reader caller errors keep their stable `reader_*` codes so clients can
//! branch on them.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lector_core::{LibraryError, ReaderError};
use lector_voice::VoiceError;
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Invalid input.
    #[error("{detail}")]
    BadRequest { code: &'static str, detail: String },

    /// Unknown session or book.
    #[error("{detail}")]
    NotFound { code: &'static str, detail: String },

    /// Request conflicts with current state (stale chunk id).
    #[error("{detail}")]
    Conflict { code: &'static str, detail: String },

    /// Speech backend unavailable.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Storage or other internal failure.
    #[error("{detail}")]
    Internal { code: &'static str, detail: String },
}

impl HttpError {
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            detail: detail.into(),
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. }
            | Self::NotFound { code, .. }
            | Self::Conflict { code, .. }
            | Self::Internal { code, .. } => *code,
            Self::ServiceUnavailable(_) => "speech_unavailable",
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: &'static str,
    detail: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), detail = %self, "Request failed");
        }
        let body = ErrorBody {
            ok: false,
            error: self.code(),
            detail: self.to_string(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ReaderError> for HttpError {
    fn from(err: ReaderError) -> Self {
        let code = err.code();
        let detail = err.to_string();
        match err {
            ReaderError::SessionNotFound(_) | ReaderError::BookNotFound(_) => {
                Self::NotFound { code, detail }
            }
            ReaderError::CommitChunkMismatch { .. } => Self::Conflict { code, detail },
            ReaderError::ChunksEmpty
            | ReaderError::SeekPhraseEmpty
            | ReaderError::InvalidUnit(_) => Self::BadRequest { code, detail },
            ReaderError::Storage(_) => Self::Internal { code, detail },
        }
    }
}

/// Code for request bodies or query strings that fail to deserialize.
pub const BAD_REQUEST_CODE: &str = "reader_bad_request";

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            code: BAD_REQUEST_CODE,
            detail: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            code: BAD_REQUEST_CODE,
            detail: rejection.body_text(),
        }
    }
}

impl From<LibraryError> for HttpError {
    fn from(err: LibraryError) -> Self {
        ReaderError::from(err).into()
    }
}

impl From<VoiceError> for HttpError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Reader(e) => e.into(),
            VoiceError::Task(msg) => Self::internal(msg),
            other => Self::ServiceUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_errors_keep_their_codes() {
        let err: HttpError = ReaderError::CommitChunkMismatch {
            expected: Some("chunk_0_a".into()),
            got: "chunk_0_b".into(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "reader_commit_chunk_mismatch");

        let err: HttpError = ReaderError::SessionNotFound("x".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "reader_session_not_found");

        let err: HttpError = ReaderError::ChunksEmpty.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn library_not_found_maps_to_book_not_found() {
        let err: HttpError = LibraryError::NotFound("abc".into()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "reader_book_not_found");
    }

    #[test]
    fn storage_failures_are_internal() {
        let err: HttpError = ReaderError::Storage(lector_core::StorageError::Lock {
            path: "/tmp/x.lock".into(),
            reason: "EAGAIN".into(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "reader_storage_failure");
    }
}
