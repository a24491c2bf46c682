//! Input sanitising for identifiers that reach the state file.

/// Maximum length of a sanitised session id.
pub const MAX_SESSION_ID_LEN: usize = 64;

/// Fallback id used when nothing survives sanitising.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Keep only `[A-Za-z0-9_-]`, truncate, and fall back to [`DEFAULT_SESSION_ID`].
#[must_use]
pub fn safe_session_id(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_SESSION_ID_LEN)
        .collect();
    if cleaned.is_empty() {
        DEFAULT_SESSION_ID.to_string()
    } else {
        cleaned
    }
}
