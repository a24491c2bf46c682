//! Reader state and library file locations.
//!
//! Everything lives under `<data_root>/reader/` except the library itself,
//! which defaults to `<data_root>/library` and can be pointed elsewhere with
//! `LECTOR_LIBRARY_DIR`.

use std::env;
use std::path::{Path, PathBuf};

use super::error::PathError;
use super::platform::{data_root, normalize_user_path};

/// Environment variable overriding the library directory.
pub const LIBRARY_DIR_ENV: &str = "LECTOR_LIBRARY_DIR";

const READER_SUBDIR: &str = "reader";
const STATE_FILE: &str = "reading_sessions.json";
const STATE_LOCK_FILE: &str = ".reading_sessions.lock";
const INDEX_FILE: &str = "reader_library_index.json";
const INDEX_LOCK_FILE: &str = ".reader_library_index.lock";

/// Directory holding the session state and library index.
#[must_use]
pub fn reader_dir_in(root: &Path) -> PathBuf {
    root.join(READER_SUBDIR)
}

/// Session state JSON file under `root`.
#[must_use]
pub fn reader_state_path_in(root: &Path) -> PathBuf {
    reader_dir_in(root).join(STATE_FILE)
}

/// Advisory lock file paired with the session state file.
#[must_use]
pub fn reader_lock_path_in(root: &Path) -> PathBuf {
    reader_dir_in(root).join(STATE_LOCK_FILE)
}

/// Library index JSON file under `root`.
#[must_use]
pub fn library_index_path_in(root: &Path) -> PathBuf {
    reader_dir_in(root).join(INDEX_FILE)
}

/// Advisory lock file paired with the library index.
#[must_use]
pub fn library_lock_path_in(root: &Path) -> PathBuf {
    reader_dir_in(root).join(INDEX_LOCK_FILE)
}

/// Session state file under the resolved data root.
pub fn reader_state_path() -> Result<PathBuf, PathError> {
    Ok(reader_state_path_in(&data_root()?))
}

/// Lock file under the resolved data root.
pub fn reader_lock_path() -> Result<PathBuf, PathError> {
    Ok(reader_lock_path_in(&data_root()?))
}

/// Library directory.
///
/// Resolution order:
/// 1. `explicit` (e.g. `--library-dir`)
/// 2. `LECTOR_LIBRARY_DIR`
/// 3. `<root>/library`
pub fn library_dir_in(root: &Path, explicit: Option<&str>) -> Result<PathBuf, PathError> {
    if let Some(raw) = explicit {
        return normalize_user_path(raw);
    }
    if let Ok(raw) = env::var(LIBRARY_DIR_ENV) {
        if !raw.trim().is_empty() {
            return normalize_user_path(&raw);
        }
    }
    Ok(root.join("library"))
}

/// Library directory under the resolved data root.
pub fn library_dir() -> Result<PathBuf, PathError> {
    library_dir_in(&data_root()?, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::{ENV_LOCK, EnvVarGuard};

    #[test]
    fn files_live_under_reader_subdir() {
        let root = Path::new("/data/lector");
        assert_eq!(
            reader_state_path_in(root),
            PathBuf::from("/data/lector/reader/reading_sessions.json")
        );
        assert_eq!(
            reader_lock_path_in(root),
            PathBuf::from("/data/lector/reader/.reading_sessions.lock")
        );
        assert_ne!(library_index_path_in(root), library_lock_path_in(root));
    }

    #[test]
    fn library_dir_resolution_order() {
        let _guard = ENV_LOCK.lock().unwrap();
        let root = Path::new("/data/lector");

        let _env = EnvVarGuard::unset(LIBRARY_DIR_ENV);
        assert_eq!(
            library_dir_in(root, None).unwrap(),
            PathBuf::from("/data/lector/library")
        );

        let _env = EnvVarGuard::set(LIBRARY_DIR_ENV, "/books");
        assert_eq!(library_dir_in(root, None).unwrap(), PathBuf::from("/books"));
        assert_eq!(
            library_dir_in(root, Some("/explicit")).unwrap(),
            PathBuf::from("/explicit")
        );
    }
}
