//! Reader session endpoint bodies.

use lector_core::domain::{
    BargeInResult, CommitResult, DeliveredChunk, ModeResult, NextOutcome, SeekOutcome,
    SessionSnapshot,
};
use lector_core::services::StreamId;
use serde::Serialize;

/// `GET /api/reader/session/next`
///
/// `chunk` is absent once the book is finished (`done: true`).
#[derive(Debug, Clone, Serialize)]
pub struct NextResponse {
    pub done: bool,
    pub cursor: usize,
    pub total_chunks: usize,
    pub replayed: bool,
    pub chunk: Option<DeliveredChunk>,
    pub speak_started: bool,
    pub stream_id: Option<StreamId>,
    pub autocommit_registered: bool,
}

impl NextResponse {
    pub fn from_outcome(outcome: NextOutcome) -> Self {
        match outcome {
            NextOutcome::Delivered {
                chunk,
                replayed,
                cursor,
            } => Self {
                done: false,
                cursor,
                total_chunks: chunk.total_chunks,
                replayed,
                chunk: Some(chunk),
                speak_started: false,
                stream_id: None,
                autocommit_registered: false,
            },
            NextOutcome::EndOfBook {
                cursor,
                total_chunks,
            } => Self {
                done: true,
                cursor,
                total_chunks,
                replayed: false,
                chunk: None,
                speak_started: false,
                stream_id: None,
                autocommit_registered: false,
            },
        }
    }
}

/// `POST /api/reader/session/commit`
#[derive(Debug, Clone, Serialize)]
pub struct CommitResponse {
    pub committed: bool,
    #[serde(flatten)]
    pub result: CommitResult,
}

/// `POST /api/reader/session/barge_in`
#[derive(Debug, Clone, Serialize)]
pub struct BargeInResponse {
    #[serde(flatten)]
    pub result: BargeInResult,
    /// An active playback stream was cancelled.
    pub stream_cancelled: bool,
    /// Playback position used for the bookmark estimate.
    pub playback_ms: Option<u64>,
}

/// `GET /api/reader/session`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
    pub speaking: bool,
    pub stream_id: Option<StreamId>,
}

/// `POST /api/reader/session/seek`
#[derive(Debug, Clone, Serialize)]
pub struct SeekResponse {
    pub seeked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl From<SeekOutcome> for SeekResponse {
    fn from(outcome: SeekOutcome) -> Self {
        match outcome {
            SeekOutcome::Found {
                chunk_index,
                offset_chars,
                text,
            } => Self {
                seeked: true,
                chunk_index: Some(chunk_index),
                offset_chars: Some(offset_chars),
                text: Some(text),
            },
            SeekOutcome::NotFound => Self {
                seeked: false,
                chunk_index: None,
                offset_chars: None,
                text: None,
            },
        }
    }
}

/// `POST /api/reader/session/manual` and `/continuous`
#[derive(Debug, Clone, Serialize)]
pub struct ModeResponse {
    #[serde(flatten)]
    pub modes: ModeResult,
}

/// `POST /api/reader/session/stop`
#[derive(Debug, Clone, Serialize)]
pub struct StopResponse {
    pub stopped: bool,
}
