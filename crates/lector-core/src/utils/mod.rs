//! Utility functions shared across crates.

pub mod chunking;
pub mod text;
pub mod validation;

pub use chunking::split_book;
pub use text::{
    char_len, char_to_byte, find_normalized, normalize_text, paragraph_starts, sentence_starts,
    snap_to_word_start, tail_from,
};
pub use validation::{DEFAULT_SESSION_ID, MAX_SESSION_ID_LEN, safe_session_id};
