//! Integration tests for the `/api/reader/session/*` endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestEnv, get, post, post_raw};

#[tokio::test]
async fn http_flow_replays_after_restart() {
    let env = TestEnv::new();
    let app = env.router();

    let (code, started) = post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "http_sess", "chunks": ["uno", "dos"], "reset": true}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(started["ok"], true);
    assert_eq!(started["started"], true);
    assert_eq!(started["total_chunks"], 2);

    let (code, first) = get(&app, "/api/reader/session/next?session_id=http_sess").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(first["chunk"]["chunk_index"], 0);
    assert_eq!(first["chunk"]["text"], "uno");
    assert_eq!(first["replayed"], false);
    let chunk_id = first["chunk"]["chunk_id"].as_str().unwrap().to_string();

    let (code, barge) = post(
        &app,
        "/api/reader/session/barge_in",
        &json!({"session_id": "http_sess", "detail": "speech_detected"}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(barge["interrupted"], true);
    assert_eq!(barge["barge_in_count"], 1);
    assert_eq!(barge["cursor"], 0);
    assert_eq!(barge["stream_cancelled"], false);

    // New services over the same files.
    let app = env.router();

    let (code, replay) = get(&app, "/api/reader/session/next?session_id=http_sess").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(replay["replayed"], true);
    assert_eq!(replay["chunk"]["chunk_id"], chunk_id.as_str());

    let (code, committed) = post(
        &app,
        "/api/reader/session/commit",
        &json!({"session_id": "http_sess", "chunk_id": chunk_id}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(committed["committed"], true);
    assert_eq!(committed["cursor"], 1);
}

#[tokio::test]
async fn speak_with_autocommit_advances_cursor() {
    let env = TestEnv::new();
    let app = env.router();

    post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "auto_sess", "chunks": ["uno", "dos"], "reset": true}),
    )
    .await;

    let (code, first) = get(
        &app,
        "/api/reader/session/next?session_id=auto_sess&speak=1&autocommit=1",
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(first["ok"], true);
    assert_eq!(first["speak_started"], true);
    assert_eq!(first["autocommit_registered"], true);
    assert!(first["stream_id"].is_string());

    let mut status = json!({});
    for _ in 0..100 {
        let (code, body) = get(&app, "/api/reader/session?session_id=auto_sess").await;
        assert_eq!(code, StatusCode::OK);
        status = body;
        if status["cursor"] == 1 && status["pending"].is_null() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status["cursor"], 1);
    assert!(status["pending"].is_null());
    assert_eq!(status["last_commit_reason"], "autocommit:tts_end");
}

#[tokio::test]
async fn stale_commit_is_a_conflict() {
    let env = TestEnv::new();
    let app = env.router();

    post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "s", "chunks": ["uno"], "reset": true}),
    )
    .await;
    get(&app, "/api/reader/session/next?session_id=s").await;

    let (code, body) = post(
        &app,
        "/api/reader/session/commit",
        &json!({"session_id": "s", "chunk_id": "chunk_0_deadbeef0000"}),
    )
    .await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "reader_commit_chunk_mismatch");

    let (_, status) = get(&app, "/api/reader/session?session_id=s").await;
    assert_eq!(status["cursor"], 0);
}

#[tokio::test]
async fn unknown_session_and_empty_chunks_are_errors() {
    let env = TestEnv::new();
    let app = env.router();

    let (code, body) = get(&app, "/api/reader/session?session_id=nadie").await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "reader_session_not_found");

    let (code, body) = post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "s", "chunks": ["  "]}),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "reader_chunks_empty");
}

#[tokio::test]
async fn end_of_book_is_not_an_error() {
    let env = TestEnv::new();
    let app = env.router();

    post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "s", "chunks": ["uno"], "reset": true}),
    )
    .await;
    let (_, first) = get(&app, "/api/reader/session/next?session_id=s").await;
    post(
        &app,
        "/api/reader/session/commit",
        &json!({"session_id": "s", "chunk_id": first["chunk"]["chunk_id"], "chunk_index": 0}),
    )
    .await;

    let (code, done) = get(&app, "/api/reader/session/next?session_id=s&speak=1").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(done["ok"], true);
    assert_eq!(done["done"], true);
    assert!(done["chunk"].is_null());
    assert_eq!(done["speak_started"], false);
}

#[tokio::test]
async fn seek_rewind_and_modes() {
    let env = TestEnv::new();
    let app = env.router();

    post(
        &app,
        "/api/reader/session/start",
        &json!({
            "session_id": "s",
            "chunks": ["Prólogo breve.", "Capítulo uno. Érase una vez un río."],
            "reset": true
        }),
    )
    .await;

    let (code, seek) = post(
        &app,
        "/api/reader/session/seek",
        &json!({"session_id": "s", "phrase": "ERASE una vez"}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(seek["seeked"], true);
    assert_eq!(seek["chunk_index"], 1);
    assert_eq!(seek["offset_chars"], 14);

    let (_, missing) = post(
        &app,
        "/api/reader/session/seek",
        &json!({"session_id": "s", "phrase": "dragones"}),
    )
    .await;
    assert_eq!(missing["ok"], true);
    assert_eq!(missing["seeked"], false);

    let (code, rewound) = post(
        &app,
        "/api/reader/session/rewind",
        &json!({"session_id": "s", "unit": "frase"}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(rewound["rewound"], true);
    assert_eq!(rewound["unit"], "sentence");

    let (code, bad) = post(
        &app,
        "/api/reader/session/rewind",
        &json!({"session_id": "s", "unit": "capitulo"}),
    )
    .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(bad["error"], "reader_invalid_unit");

    let (_, modes) = post(
        &app,
        "/api/reader/session/continuous",
        &json!({"session_id": "s", "enabled": true}),
    )
    .await;
    assert_eq!(modes["continuous_enabled"], true);
    assert_eq!(modes["manual_mode"], false);

    let (_, modes) = post(
        &app,
        "/api/reader/session/manual",
        &json!({"session_id": "s", "enabled": true}),
    )
    .await;
    assert_eq!(modes["manual_mode"], true);
    assert_eq!(modes["continuous_enabled"], false);
}

#[tokio::test]
async fn barge_in_cancels_active_stream() {
    let env = TestEnv::new();
    let app = env.router();

    // Long enough to still be playing at 100 chars/s.
    let long = "palabra ".repeat(200);
    post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "s", "chunks": [long], "reset": true}),
    )
    .await;
    let (_, first) = get(&app, "/api/reader/session/next?session_id=s&speak=1&autocommit=1").await;
    assert_eq!(first["speak_started"], true);

    let (_, status) = get(&app, "/api/reader/session?session_id=s").await;
    assert_eq!(status["speaking"], true);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let (code, barge) = post(
        &app,
        "/api/reader/session/barge_in",
        &json!({"session_id": "s", "detail": "vad", "user_interrupt": true}),
    )
    .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(barge["stream_cancelled"], true);
    assert!(barge["playback_ms"].as_u64().unwrap() >= 100);
    assert_eq!(barge["bookmark"]["chunk_index"], 0);
    assert!(barge["bookmark"]["offset_chars"].as_u64().unwrap() > 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let (_, status) = get(&app, "/api/reader/session?session_id=s").await;
    assert_eq!(status["speaking"], false);
    assert_eq!(status["cursor"], 0);
    assert_eq!(status["pending"]["chunk_id"], first["chunk"]["chunk_id"]);

    let (_, stopped) = post(&app, "/api/reader/session/stop", &json!({"session_id": "s"})).await;
    assert_eq!(stopped["stopped"], false);
}

#[tokio::test]
async fn commit_without_chunk_id_is_a_mismatch() {
    let env = TestEnv::new();
    let app = env.router();
    post(
        &app,
        "/api/reader/session/start",
        &json!({"session_id": "s", "chunks": ["uno", "dos"]}),
    )
    .await;
    get(&app, "/api/reader/session/next?session_id=s").await;

    let (code, body) = post(&app, "/api/reader/session/commit", &json!({"session_id": "s"})).await;
    assert_eq!(code, StatusCode::CONFLICT);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "reader_commit_chunk_mismatch");

    let (_, status) = get(&app, "/api/reader/session?session_id=s").await;
    assert_eq!(status["cursor"], 0);
    assert_eq!(status["pending"]["chunk_index"], 0);
}

#[tokio::test]
async fn malformed_input_gets_an_error_envelope() {
    let env = TestEnv::new();
    let app = env.router();

    let (code, body) = post_raw(&app, "/api/reader/session/start", "{not json").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "reader_bad_request");

    let (code, body) = post(&app, "/api/reader/session/manual", &json!({"session_id": "s"})).await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "reader_bad_request");

    let (code, body) = get(&app, "/api/reader/session/next?session_id=s&speak=maybe").await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "reader_bad_request");
}
