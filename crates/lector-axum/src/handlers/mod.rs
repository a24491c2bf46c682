//! HTTP handlers grouped by API surface.
//!
//! Store and library calls are synchronous file operations, so handlers run
//! them through [`blocking`] to keep the async workers free. Bodies and
//! query strings go through [`ApiJson`] / [`ApiQuery`] so malformed input
//! still answers with the `{ok:false, ...}` envelope.

pub mod library;
pub mod reader;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::{Deserialize, Deserializer};

use crate::error::HttpError;

/// `Json<T>` whose rejection is an [`HttpError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query<T>` whose rejection is an [`HttpError`].
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Run a synchronous store or library call on the blocking pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, HttpError>
where
    F: FnOnce() -> Result<T, HttpError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HttpError::internal(format!("Blocking task failed: {e}")))?
}

/// Query flag accepting `1/0`, `true/false`, `yes/no`, `on/off`; absent is `false`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => {
            lector_core::settings::parse_bool("flag", value).map_err(serde::de::Error::custom)
        }
    }
}
