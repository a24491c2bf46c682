//! Data Transfer Objects (DTOs) for the HTTP API contract.
//!
//! Every successful response is an object with `ok: true` alongside the
//! operation's fields, so domain results are flattened into an [`Envelope`].

pub mod library;
pub mod reader;

use serde::Serialize;

pub use library::{BooksResponse, RescanResponse};
pub use reader::{
    BargeInResponse, CommitResponse, ModeResponse, NextResponse, SeekResponse, StatusResponse,
    StopResponse,
};

/// `{ "ok": true, ...body }`
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub const fn ok(body: T) -> Self {
        Self { ok: true, body }
    }
}
