//! Pure state transitions over a [`SessionRecord`].
//!
//! The store loads a record under its locks, applies one of these functions,
//! and persists the result only if the record changed. Nothing here touches
//! the filesystem.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use lector_core::ReaderError;
use lector_core::domain::{
    BargeIn, BargeInResult, Bookmark, CommitResult, DeliveredChunk, ModeResult, NextOutcome,
    PendingChunk, ReaderState, RewindResult, RewindUnit, SeekOutcome, SessionRecord,
};
use lector_core::ports::NewSession;
use lector_core::utils::{
    char_len, find_normalized, normalize_text, paragraph_starts, sentence_starts,
    snap_to_word_start, tail_from,
};

/// `continuous_reason` when the last chunk is committed.
pub const REASON_EOF: &str = "eof";
/// `continuous_reason` when the listener explicitly interrupts.
pub const REASON_USER_INTERRUPT: &str = "reader_user_interrupt";

/// Fresh chunk id for a delivery at `cursor`.
pub fn mint_chunk_id(cursor: usize) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("chunk_{cursor}_{}", &token[..12])
}

/// Build a new record from start parameters. Blank chunks are dropped.
pub fn new_record(
    session_id: &str,
    params: NewSession,
    now: DateTime<Utc>,
) -> Result<SessionRecord, ReaderError> {
    let chunks: Vec<String> = params
        .chunks
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect();
    if chunks.is_empty() {
        return Err(ReaderError::ChunksEmpty);
    }

    let mut record = SessionRecord::new(session_id, chunks, now);
    record.book_id = params.book_id;
    record.continuous_enabled = params.continuous;
    Ok(record)
}

fn deliver(record: &SessionRecord, chunk_id: String, offset_chars: usize) -> DeliveredChunk {
    let text = &record.chunks[record.cursor];
    let offset_chars = if offset_chars < char_len(text) {
        offset_chars
    } else {
        0
    };
    DeliveredChunk {
        chunk_id,
        chunk_index: record.cursor,
        text: tail_from(text, offset_chars).to_string(),
        offset_chars,
        total_chunks: record.total_chunks(),
    }
}

/// Replay the pending chunk, report end of book, or deliver the chunk at the cursor.
pub fn next_chunk(record: &mut SessionRecord, now: DateTime<Utc>) -> NextOutcome {
    let cursor = record.cursor;

    if let Some(pending) = record.pending.clone() {
        if pending.chunk_index == cursor && !record.is_done() {
            let offset = record.resume_offset();
            if let Some(p) = record.pending.as_mut() {
                p.start_offset_chars = offset;
            }
            record.reader_state = ReaderState::Speaking;
            let chunk = deliver(record, pending.chunk_id, offset);
            return NextOutcome::Delivered {
                chunk,
                replayed: true,
                cursor,
            };
        }
        // A pending entry that doesn't sit at the cursor is stale.
        record.pending = None;
    }

    if record.is_done() {
        record.reader_state = ReaderState::Idle;
        if record.continuous_active {
            record.continuous_active = false;
            record.continuous_reason = Some(REASON_EOF.to_string());
        }
        return NextOutcome::EndOfBook {
            cursor,
            total_chunks: record.total_chunks(),
        };
    }

    let offset = record.resume_offset();
    let chunk_id = mint_chunk_id(cursor);
    record.pending = Some(PendingChunk {
        chunk_id: chunk_id.clone(),
        chunk_index: cursor,
        delivered_at: now,
        start_offset_chars: offset,
    });
    record.reader_state = ReaderState::Speaking;
    let active = record.continuous_enabled && !record.manual_mode;
    if active && !record.continuous_active {
        record.continuous_reason = None;
    }
    record.continuous_active = active;

    NextOutcome::Delivered {
        chunk: deliver(record, chunk_id, offset),
        replayed: false,
        cursor,
    }
}

/// Advance past the pending chunk if `chunk_id` (and `chunk_index`) match.
pub fn commit(
    record: &mut SessionRecord,
    chunk_id: &str,
    chunk_index: Option<usize>,
    reason: Option<&str>,
) -> Result<CommitResult, ReaderError> {
    let matches = record.pending.as_ref().is_some_and(|p| {
        p.chunk_id == chunk_id && chunk_index.is_none_or(|idx| idx == p.chunk_index)
    });
    if !matches {
        return Err(ReaderError::CommitChunkMismatch {
            expected: record.pending.as_ref().map(|p| p.chunk_id.clone()),
            got: chunk_id.to_string(),
        });
    }

    let committed_index = record.cursor;
    record.cursor += 1;
    record.pending = None;
    record.bookmark = None;
    record.reader_state = ReaderState::Idle;
    record.last_commit_reason = Some(reason.unwrap_or("manual").to_string());

    if record.is_done() {
        record.continuous_active = false;
        record.continuous_reason = Some(REASON_EOF.to_string());
    }

    Ok(CommitResult {
        committed_index,
        cursor: record.cursor,
        total_chunks: record.total_chunks(),
        done: record.is_done(),
        continuous_active: record.continuous_active,
    })
}

/// Estimate where playback stopped, in chars from the start of the chunk.
///
/// Assumes a constant speech rate over the text delivered from `start_offset`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn estimate_offset(
    chunk_text: &str,
    start_offset: usize,
    playback_ms: u64,
    chars_per_second: f64,
) -> usize {
    let total = char_len(chunk_text);
    let remaining = total.saturating_sub(start_offset);
    if remaining == 0 || chars_per_second <= 0.0 {
        return start_offset.min(total);
    }

    let estimated_total_ms = remaining as f64 / chars_per_second * 1000.0;
    let ratio = (playback_ms as f64 / estimated_total_ms).clamp(0.0, 1.0);
    let raw = start_offset + (remaining as f64 * ratio).floor() as usize;
    snap_to_word_start(chunk_text, raw).max(start_offset)
}

/// Record an interruption of the pending chunk. No-op without one.
pub fn mark_barge_in(
    record: &mut SessionRecord,
    barge_in: &BargeIn,
    chars_per_second: f64,
) -> BargeInResult {
    let Some(pending) = record.pending.clone() else {
        return BargeInResult {
            interrupted: false,
            barge_in_count: record.barge_in_count,
            cursor: record.cursor,
            bookmark: record.bookmark,
            reader_state: record.reader_state,
        };
    };

    record.barge_in_count += 1;
    record.reader_state = ReaderState::Commenting;
    record.last_barge_in_detail = Some(barge_in.detail.clone());

    if let (Some(ms), Some(text)) = (
        barge_in.playback_ms,
        record.chunks.get(pending.chunk_index),
    ) {
        let offset = estimate_offset(text, pending.start_offset_chars, ms, chars_per_second);
        record.bookmark = Some(Bookmark {
            chunk_index: pending.chunk_index,
            offset_chars: offset,
        });
    }

    if barge_in.user_interrupt && record.continuous_enabled {
        record.continuous_active = false;
        record.continuous_reason = Some(REASON_USER_INTERRUPT.to_string());
    }

    BargeInResult {
        interrupted: true,
        barge_in_count: record.barge_in_count,
        cursor: record.cursor,
        bookmark: record.bookmark,
        reader_state: record.reader_state,
    }
}

fn move_to(record: &mut SessionRecord, chunk_index: usize, offset_chars: usize) {
    record.cursor = chunk_index;
    record.pending = None;
    record.bookmark = Some(Bookmark {
        chunk_index,
        offset_chars,
    });
    record.reader_state = ReaderState::Idle;
}

/// Find `phrase` at or after the cursor and position the next delivery on it.
pub fn seek_phrase(record: &mut SessionRecord, phrase: &str) -> Result<SeekOutcome, ReaderError> {
    if normalize_text(phrase).is_empty() {
        return Err(ReaderError::SeekPhraseEmpty);
    }

    let found = record
        .chunks
        .iter()
        .enumerate()
        .skip(record.cursor)
        .find_map(|(idx, text)| find_normalized(text, phrase).map(|off| (idx, off)));

    let Some((chunk_index, offset_chars)) = found else {
        return Ok(SeekOutcome::NotFound);
    };

    move_to(record, chunk_index, offset_chars);
    Ok(SeekOutcome::Found {
        chunk_index,
        offset_chars,
        text: tail_from(&record.chunks[chunk_index], offset_chars).to_string(),
    })
}

/// Current listening position as `(chunk_index, offset_chars)`.
fn current_position(record: &SessionRecord) -> Option<(usize, usize)> {
    if record.chunks.is_empty() {
        return None;
    }
    if record.is_done() {
        let last = record.chunks.len() - 1;
        return Some((last, char_len(&record.chunks[last])));
    }
    let offset = match (&record.pending, record.bookmark) {
        (_, Some(bm)) if bm.chunk_index == record.cursor => bm.offset_chars,
        (Some(p), _) => p.start_offset_chars,
        _ => 0,
    };
    Some((record.cursor, offset))
}

fn unit_starts(text: &str, unit: RewindUnit) -> Vec<usize> {
    match unit {
        RewindUnit::Sentence => sentence_starts(text),
        RewindUnit::Paragraph => paragraph_starts(text),
        RewindUnit::Chunk => vec![0],
    }
}

/// Move back one unit from the current position.
///
/// Sentence and paragraph rewinds look for the closest boundary strictly
/// before the position in the current chunk, then fall back to the last
/// boundary of the previous chunk.
pub fn rewind(record: &mut SessionRecord, unit: RewindUnit) -> RewindResult {
    let unchanged = |record: &SessionRecord| RewindResult {
        unit,
        rewound: false,
        cursor: record.cursor,
        bookmark: record.bookmark,
    };

    let Some((idx, pos)) = current_position(record) else {
        return unchanged(record);
    };

    let target = match unit {
        RewindUnit::Chunk if pos > 0 => Some((idx, 0)),
        RewindUnit::Chunk => idx.checked_sub(1).map(|prev| (prev, 0)),
        RewindUnit::Sentence | RewindUnit::Paragraph => {
            let within = unit_starts(&record.chunks[idx], unit)
                .into_iter()
                .rev()
                .find(|start| *start < pos);
            within.map(|start| (idx, start)).or_else(|| {
                idx.checked_sub(1).map(|prev| {
                    let last = unit_starts(&record.chunks[prev], unit)
                        .last()
                        .copied()
                        .unwrap_or(0);
                    (prev, last)
                })
            })
        }
    };

    let Some((chunk_index, offset_chars)) = target else {
        return unchanged(record);
    };

    move_to(record, chunk_index, offset_chars);
    RewindResult {
        unit,
        rewound: true,
        cursor: record.cursor,
        bookmark: record.bookmark,
    }
}

fn mode_result(record: &SessionRecord) -> ModeResult {
    ModeResult {
        manual_mode: record.manual_mode,
        continuous_enabled: record.continuous_enabled,
        continuous_active: record.continuous_active,
        continuous_reason: record.continuous_reason.clone(),
    }
}

/// Toggle manual mode; enabling it turns continuous mode off.
pub fn set_manual_mode(
    record: &mut SessionRecord,
    enabled: bool,
    reason: Option<&str>,
) -> ModeResult {
    record.manual_mode = enabled;
    if enabled {
        record.continuous_enabled = false;
        record.continuous_active = false;
        record.continuous_reason = Some(reason.unwrap_or("manual_mode").to_string());
    }
    mode_result(record)
}

/// Toggle continuous mode; enabling it turns manual mode off.
pub fn set_continuous(
    record: &mut SessionRecord,
    enabled: bool,
    reason: Option<&str>,
) -> ModeResult {
    record.continuous_enabled = enabled;
    if enabled {
        record.manual_mode = false;
        if record.is_done() {
            record.continuous_active = false;
            record.continuous_reason = Some(REASON_EOF.to_string());
        } else {
            record.continuous_active = true;
            record.continuous_reason = reason.map(ToString::to_string);
        }
    } else {
        record.continuous_active = false;
        record.continuous_reason = Some(reason.unwrap_or("continuous_disabled").to_string());
    }
    mode_result(record)
}
