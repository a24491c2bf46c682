//! Axum handlers for the `/api/reader/rescan` and `/api/reader/books` endpoints.

use axum::Json;
use axum::extract::State;

use crate::dto::{BooksResponse, Envelope, RescanResponse};
use crate::error::HttpError;
use crate::handlers::blocking;
use crate::state::AppState;

/// `POST /api/reader/rescan`
pub async fn rescan(
    State(state): State<AppState>,
) -> Result<Json<Envelope<RescanResponse>>, HttpError> {
    let books = blocking(move || Ok(state.library.rescan()?)).await?;
    Ok(Json(Envelope::ok(RescanResponse {
        count: books.len(),
        books,
    })))
}

/// `GET /api/reader/books`
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Envelope<BooksResponse>>, HttpError> {
    let books = blocking(move || Ok(state.library.list()?)).await?;
    Ok(Json(Envelope::ok(BooksResponse { books })))
}
