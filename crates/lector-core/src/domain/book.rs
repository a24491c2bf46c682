//! Book library entries.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    Txt,
    Md,
}

impl BookFormat {
    /// Format for a file extension, case-insensitive.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Md),
            _ => None,
        }
    }
}

/// One indexed book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub book_id: String,
    pub title: String,
    /// Path relative to the library root, `/`-separated.
    pub relative_path: String,
    pub format: BookFormat,
    pub size_bytes: u64,
    pub chunk_count: usize,
}

/// Stable id for a book: first 16 hex chars of sha256 over its relative path.
#[must_use]
pub fn book_id_for(relative_path: &str) -> String {
    let digest = Sha256::digest(relative_path.as_bytes());
    let mut out = String::with_capacity(16);
    for byte in &digest[..8] {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_is_stable_and_short() {
        let a = book_id_for("novelas/quijote.txt");
        assert_eq!(a.len(), 16);
        assert_eq!(a, book_id_for("novelas/quijote.txt"));
        assert_ne!(a, book_id_for("novelas/quijote.md"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(BookFormat::from_extension("TXT"), Some(BookFormat::Txt));
        assert_eq!(BookFormat::from_extension("markdown"), Some(BookFormat::Md));
        assert_eq!(BookFormat::from_extension("pdf"), None);
    }
}
