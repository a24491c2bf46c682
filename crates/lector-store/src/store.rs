//! File-backed reader session store.
//!
//! Every public operation is one critical section:
//!
//! 1. take the in-process gate (serializes callers sharing this instance)
//! 2. take the advisory file lock (serializes other processes)
//! 3. load the state document fresh from disk
//! 4. apply a pure transition from [`crate::transitions`]
//! 5. persist via temp file + rename, only if the record changed
//!
//! There is no in-memory cache, so a failed write leaves nothing behind that
//! could diverge from the durable record.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lector_core::domain::{
    BargeIn, BargeInResult, CommitResult, ModeResult, NextOutcome, RewindResult, RewindUnit,
    SeekOutcome, SessionRecord, SessionSnapshot, StartResult,
};
use lector_core::ports::{NewSession, ReaderSessionPort};
use lector_core::settings::DEFAULT_SPEECH_CHARS_PER_SECOND;
use lector_core::utils::safe_session_id;
use lector_core::{ReaderError, ReaderSettings, ResolvedPaths, StorageError};

use crate::lock::{FileLock, LockMode};
use crate::persistence::{read_json, write_json_atomic};
use crate::transitions;

/// Current on-disk format version.
pub const STATE_VERSION: u32 = 1;

const fn current_version() -> u32 {
    STATE_VERSION
}

/// The persisted document: every session keyed by sanitized id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub sessions: BTreeMap<String, SessionRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            sessions: BTreeMap::new(),
        }
    }
}

/// Where the store keeps its files, and the speech rate for bookmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderStoreConfig {
    pub state_path: PathBuf,
    pub lock_path: PathBuf,
    pub speech_chars_per_second: f64,
}

impl ReaderStoreConfig {
    pub fn new(state_path: impl Into<PathBuf>, lock_path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            lock_path: lock_path.into(),
            speech_chars_per_second: DEFAULT_SPEECH_CHARS_PER_SECOND,
        }
    }

    pub fn from_paths(paths: &ResolvedPaths, settings: &ReaderSettings) -> Self {
        Self {
            state_path: paths.reader_state_path.clone(),
            lock_path: paths.reader_lock_path.clone(),
            speech_chars_per_second: settings.speech_chars_per_second,
        }
    }
}

/// Reader session store over a JSON file and a sibling lock file.
#[derive(Debug)]
pub struct ReaderSessionStore {
    config: ReaderStoreConfig,
    lock: FileLock,
    gate: Mutex<()>,
}

impl ReaderSessionStore {
    pub fn new(config: ReaderStoreConfig) -> Self {
        let lock = FileLock::new(config.lock_path.clone());
        Self {
            config,
            lock,
            gate: Mutex::new(()),
        }
    }

    pub const fn config(&self) -> &ReaderStoreConfig {
        &self.config
    }

    fn load(&self) -> Result<StateDocument, StorageError> {
        let doc: StateDocument = read_json(&self.config.state_path)?;
        if doc.version > STATE_VERSION {
            return Err(StorageError::UnsupportedVersion {
                path: self.config.state_path.clone(),
                found: doc.version,
            });
        }
        Ok(doc)
    }

    /// Run `op` on the whole document under the exclusive lock; persist if changed.
    fn with_document<T>(
        &self,
        op: impl FnOnce(&mut StateDocument) -> Result<T, ReaderError>,
    ) -> Result<T, ReaderError> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock.acquire(LockMode::Exclusive)?;

        let mut doc = self.load()?;
        let before = doc.clone();
        let out = op(&mut doc)?;
        if doc != before {
            doc.version = STATE_VERSION;
            write_json_atomic(&self.config.state_path, &doc)?;
        }
        Ok(out)
    }

    /// Run `op` on one existing session.
    fn with_session<T>(
        &self,
        session_id: &str,
        op: impl FnOnce(&mut SessionRecord) -> Result<T, ReaderError>,
    ) -> Result<T, ReaderError> {
        let id = safe_session_id(session_id);
        self.with_document(|doc| {
            let record = doc
                .sessions
                .get_mut(&id)
                .ok_or_else(|| ReaderError::SessionNotFound(id.clone()))?;
            let before = record.clone();
            let out = op(record)?;
            if *record != before {
                record.updated_at = Utc::now();
            }
            Ok(out)
        })
    }

    /// Ids of every stored session.
    pub fn session_ids(&self) -> Result<Vec<String>, ReaderError> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock.acquire(LockMode::Shared)?;
        Ok(self.load()?.sessions.into_keys().collect())
    }
}

impl ReaderSessionPort for ReaderSessionStore {
    fn start_session_with(
        &self,
        session_id: &str,
        params: NewSession,
    ) -> Result<StartResult, ReaderError> {
        let id = safe_session_id(session_id);
        self.with_document(|doc| {
            if !params.reset {
                if let Some(existing) = doc.sessions.get(&id) {
                    debug!(session_id = %id, cursor = existing.cursor, "Session already exists");
                    return Ok(StartResult {
                        session_id: id.clone(),
                        started: false,
                        total_chunks: existing.total_chunks(),
                        cursor: existing.cursor,
                    });
                }
            }

            let record = transitions::new_record(&id, params, Utc::now())?;
            let result = StartResult {
                session_id: id.clone(),
                started: true,
                total_chunks: record.total_chunks(),
                cursor: record.cursor,
            };
            info!(
                session_id = %id,
                total_chunks = result.total_chunks,
                book_id = ?record.book_id,
                "Started reader session"
            );
            doc.sessions.insert(id.clone(), record);
            Ok(result)
        })
    }

    fn next_chunk(&self, session_id: &str) -> Result<NextOutcome, ReaderError> {
        self.with_session(session_id, |record| {
            let outcome = transitions::next_chunk(record, Utc::now());
            match &outcome {
                NextOutcome::Delivered {
                    chunk, replayed, ..
                } => debug!(
                    session_id = %record.session_id,
                    chunk_index = chunk.chunk_index,
                    chunk_id = %chunk.chunk_id,
                    replayed,
                    "Delivered chunk"
                ),
                NextOutcome::EndOfBook { cursor, .. } => {
                    debug!(session_id = %record.session_id, cursor, "End of book");
                }
            }
            Ok(outcome)
        })
    }

    fn commit(
        &self,
        session_id: &str,
        chunk_id: &str,
        chunk_index: Option<usize>,
        reason: Option<&str>,
    ) -> Result<CommitResult, ReaderError> {
        self.with_session(session_id, |record| {
            let result = transitions::commit(record, chunk_id, chunk_index, reason)?;
            info!(
                session_id = %record.session_id,
                chunk_index = result.committed_index,
                cursor = result.cursor,
                reason = reason.unwrap_or("manual"),
                "Committed chunk"
            );
            Ok(result)
        })
    }

    fn mark_barge_in(
        &self,
        session_id: &str,
        barge_in: BargeIn,
    ) -> Result<BargeInResult, ReaderError> {
        let rate = self.config.speech_chars_per_second;
        self.with_session(session_id, |record| {
            let result = transitions::mark_barge_in(record, &barge_in, rate);
            debug!(
                session_id = %record.session_id,
                interrupted = result.interrupted,
                playback_ms = ?barge_in.playback_ms,
                bookmark = ?result.bookmark,
                "Barge-in recorded"
            );
            Ok(result)
        })
    }

    fn seek_phrase(&self, session_id: &str, phrase: &str) -> Result<SeekOutcome, ReaderError> {
        self.with_session(session_id, |record| {
            let outcome = transitions::seek_phrase(record, phrase)?;
            debug!(session_id = %record.session_id, cursor = record.cursor, ?outcome, "Seek");
            Ok(outcome)
        })
    }

    fn rewind(&self, session_id: &str, unit: RewindUnit) -> Result<RewindResult, ReaderError> {
        self.with_session(session_id, |record| {
            let result = transitions::rewind(record, unit);
            debug!(
                session_id = %record.session_id,
                unit = unit.as_str(),
                cursor = result.cursor,
                rewound = result.rewound,
                "Rewind"
            );
            Ok(result)
        })
    }

    fn set_manual_mode(
        &self,
        session_id: &str,
        enabled: bool,
        reason: Option<&str>,
    ) -> Result<ModeResult, ReaderError> {
        self.with_session(session_id, |record| {
            Ok(transitions::set_manual_mode(record, enabled, reason))
        })
    }

    fn set_continuous(
        &self,
        session_id: &str,
        enabled: bool,
        reason: Option<&str>,
    ) -> Result<ModeResult, ReaderError> {
        self.with_session(session_id, |record| {
            Ok(transitions::set_continuous(record, enabled, reason))
        })
    }

    fn get_session(
        &self,
        session_id: &str,
        include_chunks: bool,
    ) -> Result<Option<SessionSnapshot>, ReaderError> {
        let id = safe_session_id(session_id);
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock.acquire(LockMode::Shared)?;
        let doc = self.load()?;
        Ok(doc
            .sessions
            .get(&id)
            .map(|record| record.snapshot(include_chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> ReaderSessionStore {
        ReaderSessionStore::new(ReaderStoreConfig::new(
            dir.join("reading_sessions.json"),
            dir.join(".reading_sessions.lock"),
        ))
    }

    #[test]
    fn read_only_calls_do_not_create_state_file() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        assert!(store.get_session("s", false).unwrap().is_none());
        assert!(matches!(
            store.next_chunk("s"),
            Err(ReaderError::SessionNotFound(_))
        ));
        assert!(!tmp.path().join("reading_sessions.json").exists());
    }

    #[test]
    fn session_ids_are_sanitized() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());

        let started = store
            .start_session("../a b", vec!["uno".into()], true)
            .unwrap();
        assert_eq!(started.session_id, "ab");
        assert!(store.get_session("ab", false).unwrap().is_some());
        assert_eq!(store.session_ids().unwrap(), vec!["ab".to_string()]);
    }

    #[test]
    fn newer_version_is_rejected() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        fs::write(
            tmp.path().join("reading_sessions.json"),
            r#"{"version": 99, "sessions": {}}"#,
        )
        .unwrap();

        let err = store.get_session("s", false).unwrap_err();
        assert_eq!(err.code(), "reader_storage_failure");
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store.start_session("s", vec!["uno".into()], true).unwrap();

        // Occupy the temp path with a directory so the write fails.
        let temp = crate::persistence::temp_path_for(&tmp.path().join("reading_sessions.json"));
        fs::create_dir(&temp).unwrap();

        assert!(matches!(
            store.next_chunk("s"),
            Err(ReaderError::Storage(_))
        ));
        fs::remove_dir(&temp).unwrap();

        let snapshot = store.get_session("s", false).unwrap().unwrap();
        assert!(snapshot.pending.is_none());
    }
}
