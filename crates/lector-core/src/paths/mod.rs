//! Path utilities for lector data directories.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - `*_in(root)` variants are pure; the others consult the environment
//! - Nothing here creates files; adapters call [`ensure_directory`] first

mod ensure;
mod error;
mod platform;
mod reader;
mod resolver;

#[cfg(test)]
mod test_utils;

pub use ensure::ensure_directory;
pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, normalize_user_path};
pub use reader::{
    LIBRARY_DIR_ENV, library_dir, library_dir_in, library_index_path_in, library_lock_path_in,
    reader_dir_in, reader_lock_path, reader_lock_path_in, reader_state_path, reader_state_path_in,
};
pub use resolver::ResolvedPaths;
