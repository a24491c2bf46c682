//! JSON documents on disk.
//!
//! Writes go to a sibling `.tmp` file which is synced and then renamed over
//! the target, so readers only ever see a complete old or new document.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use lector_core::StorageError;

/// Read a JSON document. A missing or empty file yields `T::default()`.
pub fn read_json<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(StorageError::io("read", path, e)),
    };
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&raw).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

/// Temp path used by [`write_json_atomic`].
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Atomically replace `path` with the JSON encoding of `value`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io("create directory", parent, e))?;
    }

    let body = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = temp_path_for(path);
    let write = || -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(&body)?;
        file.write_all(b"\n")?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::io("write", &temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::io("rename", path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn missing_and_empty_files_read_as_default() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");

        let doc: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert!(doc.is_empty());

        fs::write(&path, "  \n").unwrap();
        let doc: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn write_replaces_and_leaves_no_temp_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("sub").join("state.json");

        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), 1_u32);
        write_json_atomic(&path, &doc).unwrap();
        doc.insert("b".to_string(), 2);
        write_json_atomic(&path, &doc).unwrap();

        let back: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert_eq!(back, doc);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let result: Result<BTreeMap<String, u32>, _> = read_json(&path);
        assert!(matches!(result, Err(StorageError::Serialization { .. })));
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let path = Path::new("/data/reader/reading_sessions.json");
        assert_eq!(
            temp_path_for(path),
            PathBuf::from("/data/reader/reading_sessions.json.tmp")
        );
    }
}
