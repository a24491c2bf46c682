//! Per-session playback streams.
//!
//! [`ReaderSpeaker`] owns at most one stream per session. Each stream speaks a
//! delivered chunk through the configured [`SpeechBackend`], then hands the
//! ending to the [`AutocommitCoordinator`] when autocommit was requested.
//!
//! ## Endings
//!
//! | Playback ended by            | detail                 | commits?                  |
//! |------------------------------|------------------------|---------------------------|
//! | backend finished             | `tts_end`              | yes                       |
//! | autocommit window elapsed    | `tts_end_timeout`      | if `commit_on_timeout`    |
//! | backend error                | `tts_error`            | no                        |
//! | barge-in / stop / supersede  | the interrupt cause    | no, chunk stays pending   |
//!
//! When a commit leaves continuous mode active the same task waits
//! `continuous_gap_ms`, asks the store for the next chunk and keeps going
//! until end of book, an interruption, or the mode is switched off.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lector_core::domain::{DeliveredChunk, NextOutcome};
use lector_core::ports::ReaderSessionPort;
use lector_core::services::{AutocommitCoordinator, FinalizeOutcome, StreamId};
use lector_core::utils::{char_len, safe_session_id};
use lector_core::{ReaderError, ReaderSettings};

use crate::backend::{SpeechBackend, SpeechEnd};
use crate::error::VoiceError;

/// Detail for a stream that played to the end.
pub const DETAIL_END: &str = "tts_end";
/// Detail for a stream that outlived the autocommit window.
pub const DETAIL_TIMEOUT: &str = "tts_end_timeout";
/// Detail for a backend failure.
pub const DETAIL_ERROR: &str = "tts_error";

/// Cause recorded when a barge-in cancels playback.
pub const CAUSE_BARGE_IN: &str = "barge_in_triggered";
/// Cause recorded when playback is stopped on request.
pub const CAUSE_STOPPED: &str = "stream_cancelled";
/// Cause recorded when a newer stream replaces the active one.
pub const CAUSE_SUPERSEDED: &str = "superseded";
/// Cause used when the backend reports cancellation without a recorded cause.
pub const CAUSE_INTERRUPTED: &str = "playback_interrupted";

/// How long a cancelled backend gets to wind down before its future is dropped.
const CANCEL_GRACE: Duration = Duration::from_secs(1);

// ── Stream bookkeeping ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct StreamControl {
    cancel: CancellationToken,
    cause: Mutex<Option<String>>,
}

impl StreamControl {
    /// Cancel with `cause`. The first recorded cause wins.
    fn interrupt(&self, cause: &str) {
        let mut slot = self.cause.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(cause.to_string());
        }
        drop(slot);
        self.cancel.cancel();
    }

    fn cause(&self) -> String {
        self.cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| CAUSE_INTERRUPTED.to_string())
    }
}

#[derive(Debug)]
struct ActiveStream {
    stream_id: StreamId,
    chunk_index: usize,
    /// `None` once the current chunk stopped playing.
    started_at: Option<Instant>,
    control: Arc<StreamControl>,
}

/// A stream cut short by [`ReaderSpeaker::interrupt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptedStream {
    pub stream_id: StreamId,
    pub chunk_index: usize,
    /// Wall-clock time the chunk had been playing; `None` between chained
    /// chunks, when nothing was audible.
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug)]
struct Ending {
    succeeded: bool,
    detail: String,
    force_commit: bool,
}

impl Ending {
    fn finished() -> Self {
        Self {
            succeeded: true,
            detail: DETAIL_END.to_string(),
            force_commit: false,
        }
    }

    fn interrupted(cause: String) -> Self {
        Self {
            succeeded: false,
            detail: cause,
            force_commit: false,
        }
    }

    fn failed() -> Self {
        Self {
            succeeded: false,
            detail: DETAIL_ERROR.to_string(),
            force_commit: false,
        }
    }

    fn timed_out(commit_on_timeout: bool) -> Self {
        Self {
            succeeded: false,
            detail: DETAIL_TIMEOUT.to_string(),
            force_commit: commit_on_timeout,
        }
    }
}

// ── Speaker ────────────────────────────────────────────────────────

struct SpeakerInner {
    store: Arc<dyn ReaderSessionPort>,
    coordinator: Arc<AutocommitCoordinator>,
    backend: Arc<dyn SpeechBackend>,
    settings: ReaderSettings,
    streams: Mutex<HashMap<String, ActiveStream>>,
}

/// Runs cancellable playback streams and feeds their endings to autocommit.
///
/// Stream tasks are spawned on the current Tokio runtime, so
/// [`ReaderSpeaker::speak_chunk`] must be called from within one.
pub struct ReaderSpeaker {
    inner: Arc<SpeakerInner>,
}

impl ReaderSpeaker {
    pub fn new(
        store: Arc<dyn ReaderSessionPort>,
        coordinator: Arc<AutocommitCoordinator>,
        backend: Arc<dyn SpeechBackend>,
        settings: ReaderSettings,
    ) -> Self {
        Self {
            inner: Arc::new(SpeakerInner {
                store,
                coordinator,
                backend,
                settings,
                streams: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn coordinator(&self) -> &Arc<AutocommitCoordinator> {
        &self.inner.coordinator
    }

    pub fn backend_name(&self) -> &str {
        self.inner.backend.name()
    }

    /// Start speaking `chunk` for `session_id`, replacing any active stream.
    ///
    /// With `autocommit` the stream is registered with the coordinator and
    /// its ending decides whether the chunk is committed.
    pub fn speak_chunk(
        &self,
        session_id: &str,
        chunk: &DeliveredChunk,
        autocommit: bool,
    ) -> StreamId {
        let session_id = safe_session_id(session_id);
        let stream_id = StreamId::new();
        let control = Arc::new(StreamControl::default());

        if autocommit {
            self.inner.register(&stream_id, &session_id, chunk);
        }

        let previous = self.inner.lock_streams().insert(
            session_id.clone(),
            ActiveStream {
                stream_id: stream_id.clone(),
                chunk_index: chunk.chunk_index,
                started_at: Some(Instant::now()),
                control: Arc::clone(&control),
            },
        );
        if let Some(previous) = previous {
            debug!(
                session_id = %session_id,
                stream_id = %previous.stream_id,
                "Superseding active stream"
            );
            previous.control.interrupt(CAUSE_SUPERSEDED);
        }

        info!(
            session_id = %session_id,
            %stream_id,
            chunk_index = chunk.chunk_index,
            autocommit,
            backend = self.inner.backend.name(),
            "Speaking chunk"
        );

        tokio::spawn(run_stream(
            Arc::clone(&self.inner),
            session_id,
            control,
            stream_id.clone(),
            chunk.clone(),
            autocommit,
        ));
        stream_id
    }

    /// Cancel the session's active stream with `cause`.
    ///
    /// Returns `None` when nothing was playing.
    pub fn interrupt(&self, session_id: &str, cause: &str) -> Option<InterruptedStream> {
        let session_id = safe_session_id(session_id);
        let active = self.inner.lock_streams().remove(&session_id)?;
        active.control.interrupt(cause);

        let elapsed_ms = active
            .started_at
            .map(|at| u64::try_from(at.elapsed().as_millis()).unwrap_or(u64::MAX));
        info!(
            session_id = %session_id,
            stream_id = %active.stream_id,
            elapsed_ms = ?elapsed_ms,
            cause,
            "Interrupted playback"
        );
        Some(InterruptedStream {
            stream_id: active.stream_id,
            chunk_index: active.chunk_index,
            elapsed_ms,
        })
    }

    /// Stop playback without touching the session.
    pub fn stop(&self, session_id: &str) -> bool {
        self.interrupt(session_id, CAUSE_STOPPED).is_some()
    }

    pub fn is_speaking(&self, session_id: &str) -> bool {
        self.inner
            .lock_streams()
            .contains_key(&safe_session_id(session_id))
    }

    /// Stream id currently playing for the session.
    pub fn active_stream(&self, session_id: &str) -> Option<StreamId> {
        self.inner
            .lock_streams()
            .get(&safe_session_id(session_id))
            .map(|active| active.stream_id.clone())
    }

    /// Cancel every active stream.
    pub fn shutdown(&self) {
        let drained: Vec<ActiveStream> = self
            .inner
            .lock_streams()
            .drain()
            .map(|(_, active)| active)
            .collect();
        for active in drained {
            active.control.interrupt(CAUSE_STOPPED);
        }
    }
}

impl Drop for ReaderSpeaker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ReaderSpeaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderSpeaker")
            .field("backend", &self.inner.backend.name())
            .field("active_streams", &self.inner.lock_streams().len())
            .finish_non_exhaustive()
    }
}

impl SpeakerInner {
    fn lock_streams(&self) -> MutexGuard<'_, HashMap<String, ActiveStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, stream_id: &StreamId, session_id: &str, chunk: &DeliveredChunk) {
        self.coordinator.register(
            stream_id.clone(),
            session_id,
            &chunk.chunk_id,
            chunk.chunk_index,
            char_len(&chunk.text),
            chunk.offset_chars,
        );
    }

    /// Drop the session's entry if it still belongs to `control`.
    fn release(&self, session_id: &str, control: &Arc<StreamControl>) {
        let mut streams = self.lock_streams();
        if streams
            .get(session_id)
            .is_some_and(|active| Arc::ptr_eq(&active.control, control))
        {
            streams.remove(session_id);
        }
    }

    /// Mark the session's entry as not playing if it still belongs to `control`.
    fn mark_silent(&self, session_id: &str, control: &Arc<StreamControl>) {
        if let Some(active) = self.lock_streams().get_mut(session_id) {
            if Arc::ptr_eq(&active.control, control) {
                active.started_at = None;
            }
        }
    }

    /// Point the session's entry at the next chained chunk.
    fn advance(
        &self,
        session_id: &str,
        control: &Arc<StreamControl>,
        stream_id: &StreamId,
        chunk_index: usize,
    ) -> bool {
        match self.lock_streams().get_mut(session_id) {
            Some(active) if Arc::ptr_eq(&active.control, control) => {
                active.stream_id = stream_id.clone();
                active.chunk_index = chunk_index;
                active.started_at = Some(Instant::now());
                true
            }
            _ => false,
        }
    }

    async fn play(&self, text: &str, control: &StreamControl) -> Ending {
        let limit = Duration::from_millis(self.settings.autocommit_timeout_ms);
        let speak = tokio::time::timeout(limit, self.backend.speak(text, control.cancel.child_token()));

        let result = tokio::select! {
            biased;
            result = speak => Some(result),
            () = async {
                control.cancel.cancelled().await;
                tokio::time::sleep(CANCEL_GRACE).await;
            } => None,
        };

        if control.cancel.is_cancelled() {
            return Ending::interrupted(control.cause());
        }
        match result {
            Some(Ok(Ok(SpeechEnd::Finished))) => Ending::finished(),
            Some(Ok(Ok(SpeechEnd::Cancelled))) | None => Ending::interrupted(control.cause()),
            Some(Ok(Err(e))) => {
                warn!(backend = self.backend.name(), error = %e, "Speech backend failed");
                Ending::failed()
            }
            Some(Err(_elapsed)) => {
                warn!(
                    backend = self.backend.name(),
                    timeout_ms = self.settings.autocommit_timeout_ms,
                    "Playback exceeded autocommit window"
                );
                Ending::timed_out(self.settings.commit_on_timeout)
            }
        }
    }

    async fn finalize(&self, stream_id: StreamId, ending: Ending) -> Option<FinalizeOutcome> {
        let coordinator = Arc::clone(&self.coordinator);
        let result = blocking(move || {
            coordinator.finalize(
                &stream_id,
                ending.succeeded,
                &ending.detail,
                ending.force_commit,
            )
        })
        .await;

        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "Autocommit finalize failed");
                None
            }
        }
    }

    /// After a commit in continuous mode, fetch the next chunk to speak.
    async fn next_in_chain(
        &self,
        session_id: &str,
        control: &StreamControl,
        outcome: Option<FinalizeOutcome>,
    ) -> Option<DeliveredChunk> {
        let Some(FinalizeOutcome::Committed { result, .. }) = outcome else {
            return None;
        };
        if result.done || !result.continuous_active {
            return None;
        }

        tokio::select! {
            () = control.cancel.cancelled() => return None,
            () = tokio::time::sleep(Duration::from_millis(self.settings.continuous_gap_ms)) => {}
        }

        let store = Arc::clone(&self.store);
        let id = session_id.to_string();
        match blocking(move || store.get_session(&id, false)).await {
            Ok(Some(s)) if s.continuous_active && !s.manual_mode && !s.done => {}
            Ok(_) => {
                debug!(session_id, "Continuous mode no longer active");
                return None;
            }
            Err(e) => {
                warn!(session_id, error = %e, "Failed to read session for continuous mode");
                return None;
            }
        }
        if control.cancel.is_cancelled() {
            return None;
        }

        let store = Arc::clone(&self.store);
        let id = session_id.to_string();
        match blocking(move || store.next_chunk(&id)).await {
            Ok(NextOutcome::Delivered { chunk, .. }) => Some(chunk),
            Ok(NextOutcome::EndOfBook { .. }) => {
                info!(session_id, "Continuous reading reached end of book");
                None
            }
            Err(e) => {
                warn!(session_id, error = %e, "Continuous mode failed to fetch next chunk");
                None
            }
        }
    }
}

async fn run_stream(
    inner: Arc<SpeakerInner>,
    session_id: String,
    control: Arc<StreamControl>,
    mut stream_id: StreamId,
    mut chunk: DeliveredChunk,
    autocommit: bool,
) {
    loop {
        let ending = inner.play(&chunk.text, &control).await;
        inner.mark_silent(&session_id, &control);
        debug!(
            session_id = %session_id,
            %stream_id,
            detail = %ending.detail,
            succeeded = ending.succeeded,
            "Playback ended"
        );

        if !autocommit {
            inner.release(&session_id, &control);
            return;
        }

        let outcome = inner.finalize(stream_id.clone(), ending).await;
        let Some(next) = inner.next_in_chain(&session_id, &control, outcome).await else {
            inner.release(&session_id, &control);
            return;
        };

        stream_id = StreamId::new();
        if !inner.advance(&session_id, &control, &stream_id, next.chunk_index) {
            return;
        }
        inner.register(&stream_id, &session_id, &next);
        info!(
            session_id = %session_id,
            %stream_id,
            chunk_index = next.chunk_index,
            "Continuing to next chunk"
        );
        chunk = next;
    }
}

/// Run a synchronous store call off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, VoiceError>
where
    F: FnOnce() -> Result<T, ReaderError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| VoiceError::Task(e.to_string()))?
        .map_err(VoiceError::from)
}
