//! Status command handler: reads a session straight from the state file.

use anyhow::{Context, Result, bail};
use lector_core::{ReaderSessionPort, ReaderSettings, ResolvedPaths};
use lector_store::{ReaderSessionStore, ReaderStoreConfig};

pub fn execute(
    paths: &ResolvedPaths,
    settings: &ReaderSettings,
    session_id: &str,
    include_chunks: bool,
) -> Result<()> {
    let store = ReaderSessionStore::new(ReaderStoreConfig::from_paths(paths, settings));
    println!("{}", render(&store, session_id, include_chunks)?);
    Ok(())
}

/// Pretty JSON snapshot of one session.
pub fn render(
    store: &dyn ReaderSessionPort,
    session_id: &str,
    include_chunks: bool,
) -> Result<String> {
    let Some(snapshot) = store.get_session(session_id, include_chunks)? else {
        bail!("Reader session '{session_id}' not found");
    };
    serde_json::to_string_pretty(&snapshot).context("Failed to encode session snapshot")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &std::path::Path) -> ReaderSessionStore {
        ReaderSessionStore::new(ReaderStoreConfig::new(
            dir.join("reading_sessions.json"),
            dir.join(".reading_sessions.lock"),
        ))
    }

    #[test]
    fn renders_cursor_and_pending() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        store
            .start_session("libro", vec!["Uno.".into(), "Dos.".into()], false)
            .unwrap();
        store.next_chunk("libro").unwrap();

        let out = render(&store, "libro", false).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["session_id"], "libro");
        assert_eq!(json["cursor"], 0);
        assert_eq!(json["pending"]["chunk_index"], 0);
    }

    #[test]
    fn missing_session_is_an_error() {
        let tmp = tempdir().unwrap();
        let store = store_in(tmp.path());
        let err = render(&store, "nada", false).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
