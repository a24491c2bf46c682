//! Platform data directory detection.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "LECTOR_DATA_DIR";

/// Get the root directory for application data (session state, library index).
///
/// Resolution order:
/// 1. `LECTOR_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/lector`)
///
/// Does not create the directory; see [`super::ensure_directory`].
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return normalize_user_path(&path);
        }
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("lector"))
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::test_utils::{ENV_LOCK, EnvVarGuard};

    #[test]
    fn env_override_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        let _env = EnvVarGuard::set(DATA_DIR_ENV, "/tmp/lector-test-root");

        assert_eq!(data_root().unwrap(), PathBuf::from("/tmp/lector-test-root"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = normalize_user_path("relative/dir").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("relative/dir"));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(normalize_user_path("  "), Err(PathError::EmptyPath)));
    }
}
