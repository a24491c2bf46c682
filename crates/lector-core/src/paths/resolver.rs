//! Pure path resolver for the composition root and the `lector paths` command.

use std::path::{Path, PathBuf};

use super::{
    PathError, data_root, library_dir_in, library_index_path_in, library_lock_path_in,
    normalize_user_path, reader_lock_path_in, reader_state_path_in,
};

/// All resolved paths captured in a single struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Root directory for application data.
    pub data_root: PathBuf,
    /// Session state JSON document.
    pub reader_state_path: PathBuf,
    /// Advisory lock for the state document (never holds data).
    pub reader_lock_path: PathBuf,
    /// Directory scanned for books.
    pub library_dir: PathBuf,
    /// Library index JSON document.
    pub library_index_path: PathBuf,
    /// Advisory lock for the library index.
    pub library_lock_path: PathBuf,
}

impl ResolvedPaths {
    /// Resolve all paths using the current environment.
    pub fn resolve() -> Result<Self, PathError> {
        Self::resolve_with(None, None)
    }

    /// Resolve with explicit overrides (e.g. `--data-dir`, `--library-dir`).
    pub fn resolve_with(
        data_dir: Option<&str>,
        library_dir: Option<&str>,
    ) -> Result<Self, PathError> {
        let root = match data_dir {
            Some(raw) => normalize_user_path(raw)?,
            None => data_root()?,
        };
        let library = library_dir_in(&root, library_dir)?;
        Ok(Self::under(&root, library))
    }

    /// Lay out every path beneath `root` with the given library directory.
    #[must_use]
    pub fn under(root: &Path, library_dir: PathBuf) -> Self {
        Self {
            data_root: root.to_path_buf(),
            reader_state_path: reader_state_path_in(root),
            reader_lock_path: reader_lock_path_in(root),
            library_dir,
            library_index_path: library_index_path_in(root),
            library_lock_path: library_lock_path_in(root),
        }
    }
}

impl std::fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "data_root = {}", self.data_root.display())?;
        writeln!(f, "reader_state_path = {}", self.reader_state_path.display())?;
        writeln!(f, "reader_lock_path = {}", self.reader_lock_path.display())?;
        writeln!(f, "library_dir = {}", self.library_dir.display())?;
        writeln!(
            f,
            "library_index_path = {}",
            self.library_index_path.display()
        )?;
        write!(f, "library_lock_path = {}", self.library_lock_path.display())
    }
}
