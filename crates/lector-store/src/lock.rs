//! OS advisory file locks.
//!
//! The lock file never holds data. Readers take a shared lock, writers an
//! exclusive one, and the lock is released when the guard drops, so two
//! processes never interleave a read with a half-written state file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use lector_core::StorageError;

#[cfg(unix)]
use nix::fcntl::{Flock, FlockArg};

/// Requested lock strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// A lock file path.
#[derive(Debug, Clone)]
pub struct FileLock {
    path: PathBuf,
}

/// Held lock; released on drop.
pub struct LockGuard {
    #[cfg(unix)]
    _flock: Flock<File>,
    #[cfg(not(unix))]
    _file: File,
    mode: LockMode,
}

impl LockGuard {
    pub const fn mode(&self) -> LockMode {
        self.mode
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("mode", &self.mode).finish()
    }
}

impl FileLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the lock is held in `mode`.
    pub fn acquire(&self, mode: LockMode) -> Result<LockGuard, StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io("create directory", parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| StorageError::io("open lock file", &self.path, e))?;

        #[cfg(unix)]
        {
            let arg = match mode {
                LockMode::Shared => FlockArg::LockShared,
                LockMode::Exclusive => FlockArg::LockExclusive,
            };
            let flock = Flock::lock(file, arg).map_err(|(_, errno)| StorageError::Lock {
                path: self.path.clone(),
                reason: errno.to_string(),
            })?;
            Ok(LockGuard {
                _flock: flock,
                mode,
            })
        }

        #[cfg(not(unix))]
        {
            // No advisory locking here; the in-process mutex still serializes callers.
            Ok(LockGuard { _file: file, mode })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_lock_file_and_parent() {
        let tmp = tempdir().unwrap();
        let lock = FileLock::new(tmp.path().join("nested").join(".state.lock"));

        let guard = lock.acquire(LockMode::Exclusive).unwrap();
        assert_eq!(guard.mode(), LockMode::Exclusive);
        assert!(lock.path().exists());
    }

    #[test]
    fn shared_locks_coexist() {
        let tmp = tempdir().unwrap();
        let lock = FileLock::new(tmp.path().join(".state.lock"));

        let first = lock.acquire(LockMode::Shared).unwrap();
        let second = lock.acquire(LockMode::Shared).unwrap();
        assert_eq!(first.mode(), second.mode());
    }

    #[test]
    fn exclusive_is_reacquirable_after_drop() {
        let tmp = tempdir().unwrap();
        let lock = FileLock::new(tmp.path().join(".state.lock"));

        drop(lock.acquire(LockMode::Exclusive).unwrap());
        let again = lock.acquire(LockMode::Exclusive).unwrap();
        assert_eq!(again.mode(), LockMode::Exclusive);
    }
}
