//! Directory creation.

use std::fs;
use std::path::Path;

use super::error::PathError;

/// Create `path` (and parents) if missing; fail if it exists as a non-directory.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_nested_directories() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory(&nested).unwrap();
    }

    #[test]
    fn rejects_files() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            ensure_directory(&file),
            Err(PathError::NotADirectory(_))
        ));
    }
}
