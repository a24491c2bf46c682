//! Library endpoint bodies.

use lector_core::BookEntry;
use serde::Serialize;

/// `POST /api/reader/rescan`
#[derive(Debug, Clone, Serialize)]
pub struct RescanResponse {
    pub count: usize,
    pub books: Vec<BookEntry>,
}

/// `GET /api/reader/books`
#[derive(Debug, Clone, Serialize)]
pub struct BooksResponse {
    pub books: Vec<BookEntry>,
}
