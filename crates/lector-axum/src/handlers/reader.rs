//! Axum handlers for the `/api/reader/session/*` endpoints.
//!
//! Request deserialization structs are co-located here. Missing `session_id`
//! falls back to the default session after sanitizing.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use tracing::debug;

use lector_core::ReaderError;
use lector_core::domain::{
    BargeIn, NextOutcome, RewindResult, RewindUnit, SeekOutcome, StartResult,
};
use lector_core::ports::NewSession;
use lector_core::utils::safe_session_id;
use lector_voice::CAUSE_BARGE_IN;

use crate::dto::{
    BargeInResponse, CommitResponse, Envelope, ModeResponse, NextResponse, SeekResponse,
    StatusResponse, StopResponse,
};
use crate::error::HttpError;
use crate::handlers::{ApiJson, ApiQuery, blocking, flag};
use crate::state::AppState;

// ── Request shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub chunks: Option<Vec<String>>,
    #[serde(default)]
    pub book_id: Option<String>,
    #[serde(default)]
    pub reset: bool,
    #[serde(default)]
    pub continuous: bool,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, deserialize_with = "flag")]
    pub speak: bool,
    #[serde(default, deserialize_with = "flag")]
    pub autocommit: bool,
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    #[serde(default)]
    pub session_id: String,
    /// Missing ids fail in the store as a chunk mismatch.
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub chunk_index: Option<usize>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BargeInRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub playback_ms: Option<u64>,
    #[serde(default)]
    pub user_interrupt: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: String,
    #[serde(default, deserialize_with = "flag")]
    pub include_chunks: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub phrase: String,
}

#[derive(Debug, Deserialize)]
pub struct RewindRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    #[serde(default)]
    pub session_id: String,
    pub enabled: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    #[serde(default)]
    pub session_id: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /api/reader/session/start`
///
/// Chunks come from `book_id` when given, otherwise from `chunks`.
pub async fn start(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StartRequest>,
) -> Result<Json<Envelope<StartResult>>, HttpError> {
    let session_id = safe_session_id(&req.session_id);
    if req.reset {
        state.speaker.stop(&session_id);
    }

    let result = blocking(move || {
        let mut params = match &req.book_id {
            Some(book_id) => {
                NewSession::new(state.library.chunks(book_id)?).book_id(book_id.clone())
            }
            None => NewSession::new(req.chunks.unwrap_or_default()),
        };
        params = params.reset(req.reset).continuous(req.continuous);
        Ok(state.store.start_session_with(&session_id, params)?)
    })
    .await?;

    Ok(Json(Envelope::ok(result)))
}

/// `GET /api/reader/session/next`
///
/// With `speak=1` the chunk is handed to the speaker; `autocommit=1` lets the
/// stream ending commit it.
pub async fn next(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NextQuery>,
) -> Result<Json<Envelope<NextResponse>>, HttpError> {
    let session_id = safe_session_id(&query.session_id);

    let outcome = {
        let state = state.clone();
        let id = session_id.clone();
        blocking(move || Ok(state.store.next_chunk(&id)?)).await?
    };
    let delivered = match &outcome {
        NextOutcome::Delivered { chunk, .. } => Some(chunk.clone()),
        NextOutcome::EndOfBook { .. } => None,
    };
    let mut response = NextResponse::from_outcome(outcome);

    if query.speak {
        if let Some(chunk) = delivered {
            let stream_id = state
                .speaker
                .speak_chunk(&session_id, &chunk, query.autocommit);
            response.speak_started = true;
            response.stream_id = Some(stream_id);
            response.autocommit_registered = query.autocommit;
        } else {
            debug!(session_id = %session_id, "Nothing to speak at end of book");
        }
    }

    Ok(Json(Envelope::ok(response)))
}

/// `POST /api/reader/session/commit`
pub async fn commit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CommitRequest>,
) -> Result<Json<Envelope<CommitResponse>>, HttpError> {
    let result = blocking(move || {
        Ok(state.store.commit(
            &req.session_id,
            &req.chunk_id,
            req.chunk_index,
            req.reason.as_deref(),
        )?)
    })
    .await?;

    Ok(Json(Envelope::ok(CommitResponse {
        committed: true,
        result,
    })))
}

/// `POST /api/reader/session/barge_in`
///
/// Cancels the session's playback first, so its stream ends as an
/// interruption and the chunk stays pending. The stream's elapsed time stands
/// in for `playback_ms` when the caller doesn't send one.
pub async fn barge_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BargeInRequest>,
) -> Result<Json<Envelope<BargeInResponse>>, HttpError> {
    let session_id = safe_session_id(&req.session_id);
    let interrupted = state.speaker.interrupt(&session_id, CAUSE_BARGE_IN);
    let playback_ms = req
        .playback_ms
        .or_else(|| interrupted.as_ref().and_then(|s| s.elapsed_ms));

    let barge_in = BargeIn {
        detail: req
            .detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "barge_in".to_string()),
        playback_ms,
        user_interrupt: req.user_interrupt,
    };
    let result = blocking(move || Ok(state.store.mark_barge_in(&session_id, barge_in)?)).await?;

    Ok(Json(Envelope::ok(BargeInResponse {
        result,
        stream_cancelled: interrupted.is_some(),
        playback_ms,
    })))
}

/// `GET /api/reader/session`
pub async fn status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Envelope<StatusResponse>>, HttpError> {
    let session_id = safe_session_id(&query.session_id);
    let snapshot = {
        let state = state.clone();
        let id = session_id.clone();
        blocking(move || Ok(state.store.get_session(&id, query.include_chunks)?)).await?
    }
    .ok_or_else(|| ReaderError::SessionNotFound(session_id.clone()))?;

    Ok(Json(Envelope::ok(StatusResponse {
        snapshot,
        speaking: state.speaker.is_speaking(&session_id),
        stream_id: state.speaker.active_stream(&session_id),
    })))
}

/// `POST /api/reader/session/seek`
pub async fn seek(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SeekRequest>,
) -> Result<Json<Envelope<SeekResponse>>, HttpError> {
    let session_id = safe_session_id(&req.session_id);
    let outcome = {
        let state = state.clone();
        let id = session_id.clone();
        blocking(move || Ok(state.store.seek_phrase(&id, &req.phrase)?)).await?
    };
    if matches!(outcome, SeekOutcome::Found { .. }) {
        state.speaker.stop(&session_id);
    }
    Ok(Json(Envelope::ok(outcome.into())))
}

/// `POST /api/reader/session/rewind`
pub async fn rewind(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RewindRequest>,
) -> Result<Json<Envelope<RewindResult>>, HttpError> {
    let unit = match req.unit.as_deref().map(str::trim) {
        None | Some("") => RewindUnit::Sentence,
        Some(raw) => RewindUnit::parse(raw).ok_or_else(|| ReaderError::InvalidUnit(raw.into()))?,
    };
    let session_id = safe_session_id(&req.session_id);
    state.speaker.stop(&session_id);

    let result = blocking(move || Ok(state.store.rewind(&session_id, unit)?)).await?;
    Ok(Json(Envelope::ok(result)))
}

/// `POST /api/reader/session/manual`
pub async fn manual(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ModeRequest>,
) -> Result<Json<Envelope<ModeResponse>>, HttpError> {
    let modes = blocking(move || {
        Ok(state
            .store
            .set_manual_mode(&req.session_id, req.enabled, req.reason.as_deref())?)
    })
    .await?;
    Ok(Json(Envelope::ok(ModeResponse { modes })))
}

/// `POST /api/reader/session/continuous`
pub async fn continuous(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ModeRequest>,
) -> Result<Json<Envelope<ModeResponse>>, HttpError> {
    let modes = blocking(move || {
        Ok(state
            .store
            .set_continuous(&req.session_id, req.enabled, req.reason.as_deref())?)
    })
    .await?;
    Ok(Json(Envelope::ok(ModeResponse { modes })))
}

/// `POST /api/reader/session/stop`
///
/// Cancels playback only; the pending chunk and cursor are untouched.
pub async fn stop(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<StopRequest>,
) -> Json<Envelope<StopResponse>> {
    let stopped = state.speaker.stop(&req.session_id);
    Json(Envelope::ok(StopResponse { stopped }))
}
