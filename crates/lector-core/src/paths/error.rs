//! Errors from resolving and preparing lector's data paths.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// `~` expansion needs a home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// No platform data directory and no `LECTOR_DATA_DIR`.
    #[error("Cannot determine a data directory; set LECTOR_DATA_DIR")]
    NoDataDir,

    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to create directory {path}: {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    #[error("Path cannot be empty")]
    EmptyPath,

    /// Relative paths are anchored at the working directory.
    #[error("Cannot resolve relative path against the working directory: {0}")]
    CurrentDirError(String),
}
