//! Shared fixtures for lector-axum route tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use lector_axum::bootstrap::{CorsConfig, ServerConfig, bootstrap};
use lector_axum::routes::create_router;
use lector_core::ReaderSettings;

/// Temporary data root; routers built from it share state and lock files.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn config(&self) -> ServerConfig {
        ServerConfig::under(self.dir.path())
            .unwrap()
            .with_settings(ReaderSettings {
                speech_chars_per_second: 100.0,
                continuous_gap_ms: 0,
                ..ReaderSettings::default()
            })
    }

    /// Fresh router over the same files, as after a process restart.
    pub fn router(&self) -> Router {
        let ctx = bootstrap(&self.config()).unwrap();
        create_router(ctx, &CorsConfig::AllowAll)
    }
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// POST an arbitrary body, e.g. malformed JSON.
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body)
        .unwrap_or_else(|e| panic!("Expected JSON body ({status}): {e}"));
    (status, json)
}
