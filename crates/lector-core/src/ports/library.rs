//! Book catalog port.
//!
//! Turns source files in the library directory into ordered chunk lists.
//! The session store never reads books itself; handlers resolve a `book_id`
//! through this port and pass the chunks to `start_session`.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::BookEntry;
use crate::error::{ReaderError, StorageError};

/// Errors from library scanning and lookup.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Book '{0}' not found in library")]
    NotFound(String),

    #[error("Library directory {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LibraryError> for ReaderError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(id) => Self::BookNotFound(id),
            LibraryError::NotADirectory(path) => Self::Storage(StorageError::io(
                "scan",
                path,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            )),
            LibraryError::Storage(e) => Self::Storage(e),
        }
    }
}

/// Catalog of books available for reading.
pub trait BookCatalogPort: Send + Sync {
    /// Re-scan the library directory and rewrite the index.
    fn rescan(&self) -> Result<Vec<BookEntry>, LibraryError>;

    /// Books in the current index (no scan).
    fn list(&self) -> Result<Vec<BookEntry>, LibraryError>;

    /// Chunk list for a book, read fresh from its source file.
    fn chunks(&self, book_id: &str) -> Result<Vec<String>, LibraryError>;
}
