//! Book library: scans a directory for `.txt` / `.md` books and keeps an index.
//!
//! The index shares the store's persistence discipline (advisory lock plus
//! atomic rename). Chunk lists are produced on demand from the source file so
//! editing a book and rescanning never leaves stale chunks in the index.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use lector_core::domain::{BookEntry, BookFormat, book_id_for};
use lector_core::ports::{BookCatalogPort, LibraryError};
use lector_core::settings::DEFAULT_MAX_CHUNK_CHARS;
use lector_core::utils::split_book;
use lector_core::{ReaderSettings, ResolvedPaths, StorageError};

use crate::lock::{FileLock, LockMode};
use crate::persistence::{read_json, write_json_atomic};

/// Library locations and chunking limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub library_dir: PathBuf,
    pub index_path: PathBuf,
    pub lock_path: PathBuf,
    pub max_chunk_chars: usize,
}

impl LibraryConfig {
    pub fn new(
        library_dir: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        lock_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            library_dir: library_dir.into(),
            index_path: index_path.into(),
            lock_path: lock_path.into(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }

    pub fn from_paths(paths: &ResolvedPaths, settings: &ReaderSettings) -> Self {
        Self {
            library_dir: paths.library_dir.clone(),
            index_path: paths.library_index_path.clone(),
            lock_path: paths.library_lock_path.clone(),
            max_chunk_chars: settings.max_chunk_chars,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    scanned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    books: Vec<BookEntry>,
}

/// File-backed [`BookCatalogPort`].
#[derive(Debug)]
pub struct BookLibrary {
    config: LibraryConfig,
    lock: FileLock,
    gate: Mutex<()>,
}

impl BookLibrary {
    pub fn new(config: LibraryConfig) -> Self {
        let lock = FileLock::new(config.lock_path.clone());
        Self {
            config,
            lock,
            gate: Mutex::new(()),
        }
    }

    pub fn library_dir(&self) -> &Path {
        &self.config.library_dir
    }

    fn read_book(&self, path: &Path) -> Result<String, StorageError> {
        let bytes = fs::read(path).map_err(|e| StorageError::io("read", path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn index_file(&self, path: &Path, relative: &str) -> Option<BookEntry> {
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(BookFormat::from_extension)?;

        let size_bytes = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let text = match self.read_book(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable book");
                return None;
            }
        };
        let chunk_count = split_book(&text, format, self.config.max_chunk_chars).len();

        Some(BookEntry {
            book_id: book_id_for(relative),
            title: title_from_path(path),
            relative_path: relative.to_string(),
            format,
            size_bytes,
            chunk_count,
        })
    }
}

/// `capitulo_uno.txt` → `capitulo uno`.
fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .map(|title| title.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Every regular file under `root`, skipping hidden entries.
fn walk(root: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| StorageError::io("scan", &dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("scan", &dir, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl BookCatalogPort for BookLibrary {
    fn rescan(&self) -> Result<Vec<BookEntry>, LibraryError> {
        let root = &self.config.library_dir;
        if root.exists() && !root.is_dir() {
            return Err(LibraryError::NotADirectory(root.clone()));
        }
        fs::create_dir_all(root).map_err(|e| StorageError::io("create directory", root, e))?;

        let mut books: Vec<BookEntry> = walk(root)?
            .iter()
            .filter_map(|path| self.index_file(path, &relative_key(root, path)))
            .collect();
        books.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock.acquire(LockMode::Exclusive)?;
        let index = LibraryIndex {
            scanned_at: Some(Utc::now()),
            books: books.clone(),
        };
        write_json_atomic(&self.config.index_path, &index)?;

        info!(
            library_dir = %root.display(),
            count = books.len(),
            "Rescanned reader library"
        );
        Ok(books)
    }

    fn list(&self) -> Result<Vec<BookEntry>, LibraryError> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock.acquire(LockMode::Shared)?;
        let index: LibraryIndex = read_json(&self.config.index_path)?;
        Ok(index.books)
    }

    fn chunks(&self, book_id: &str) -> Result<Vec<String>, LibraryError> {
        let entry = self
            .list()?
            .into_iter()
            .find(|b| b.book_id == book_id)
            .ok_or_else(|| LibraryError::NotFound(book_id.to_string()))?;

        let path = self.config.library_dir.join(&entry.relative_path);
        let text = match fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LibraryError::NotFound(book_id.to_string()));
            }
            Err(e) => return Err(StorageError::io("read", &path, e).into()),
        };

        let chunks = split_book(&text, entry.format, self.config.max_chunk_chars);
        debug!(book_id, chunks = chunks.len(), "Loaded book chunks");
        Ok(chunks)
    }
}
