//! Text helpers for reading positions.
//!
//! All offsets in this module are **character** offsets, matching how
//! bookmarks are persisted. Matching is case and diacritic insensitive.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lowercase, strip diacritics (NFKD minus combining marks) and collapse
/// whitespace runs to a single space.
#[must_use]
pub fn normalize_text(value: &str) -> String {
    fold(value).into_iter().collect()
}

/// Folded characters without leading or trailing spaces.
///
/// Lowercasing is per character so the needle and the haystack fold the
/// same way (no context-dependent forms such as final sigma).
fn fold(text: &str) -> Vec<char> {
    let (mut folded, _) = folded_with_origin(text);
    if folded.last() == Some(&' ') {
        folded.pop();
    }
    folded
}

/// Folded characters of `text` plus, for each, the char index it came from.
fn folded_with_origin(text: &str) -> (Vec<char>, Vec<usize>) {
    let mut folded = Vec::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    let mut prev_space = true;

    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if !prev_space {
                folded.push(' ');
                origin.push(idx);
                prev_space = true;
            }
            continue;
        }
        prev_space = false;
        for part in ch.to_lowercase().nfkd() {
            if !is_combining_mark(part) {
                // Final sigma folds like its uppercase.
                folded.push(if part == 'ς' { 'σ' } else { part });
                origin.push(idx);
            }
        }
    }

    (folded, origin)
}

/// Char offset in `haystack` where `needle` first occurs, ignoring case,
/// accents and whitespace differences.
#[must_use]
pub fn find_normalized(haystack: &str, needle: &str) -> Option<usize> {
    let needle = fold(needle);
    if needle.is_empty() {
        return None;
    }
    let (folded, origin) = folded_with_origin(haystack);
    folded
        .windows(needle.len())
        .position(|window| window == needle.as_slice())
        .map(|pos| origin[pos])
}

/// Number of characters in `text`.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of char offset `char_idx`, clamped to `text.len()`.
#[must_use]
pub fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Suffix of `text` starting at char offset `char_idx`.
#[must_use]
pub fn tail_from(text: &str, char_idx: usize) -> &str {
    &text[char_to_byte(text, char_idx)..]
}

fn skip_whitespace(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

const fn is_sentence_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

const fn is_closing_mark(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | '»' | ']')
}

/// Char offsets where paragraphs start (first non-blank char after a blank line).
#[must_use]
pub fn paragraph_starts(text: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut starts = Vec::new();

    let first = skip_whitespace(&chars, 0);
    if first < chars.len() {
        starts.push(first);
    }

    for i in 0..chars.len() {
        if chars[i] != '\n' {
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j], ' ' | '\t' | '\r') {
            j += 1;
        }
        if j < chars.len() && chars[j] == '\n' {
            let next = skip_whitespace(&chars, j);
            if next < chars.len() && starts.last() != Some(&next) {
                starts.push(next);
            }
        }
    }

    starts
}

/// Char offsets where sentences start. Paragraph starts are sentence starts.
#[must_use]
pub fn sentence_starts(text: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut starts = paragraph_starts(text);

    for i in 0..chars.len() {
        if !is_sentence_terminal(chars[i]) {
            continue;
        }
        let mut j = i + 1;
        while j < chars.len() && is_closing_mark(chars[j]) {
            j += 1;
        }
        if j < chars.len() && chars[j].is_whitespace() {
            let next = skip_whitespace(&chars, j);
            if next < chars.len() {
                starts.push(next);
            }
        }
    }

    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Snap a char offset to the start of the word it falls in.
///
/// An offset on whitespace moves forward to the next word. The result is
/// always a word start strictly inside `text`, or 0 for blank text.
#[must_use]
pub fn snap_to_word_start(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return 0;
    }

    let mut pos = offset.min(len - 1);
    if chars[pos].is_whitespace() {
        let forward = skip_whitespace(&chars, pos);
        if forward < len {
            return forward;
        }
        while pos > 0 && chars[pos].is_whitespace() {
            pos -= 1;
        }
    }
    while pos > 0 && !chars[pos - 1].is_whitespace() {
        pos -= 1;
    }
    pos
}
