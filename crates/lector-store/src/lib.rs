//! File-backed adapters for lector: the reader session store, the book
//! library index, and the advisory-lock / atomic-write plumbing they share.

pub mod library;
pub mod lock;
pub mod persistence;
pub mod store;
pub mod transitions;

pub use library::{BookLibrary, LibraryConfig};
pub use lock::{FileLock, LockGuard, LockMode};
pub use store::{ReaderSessionStore, ReaderStoreConfig, STATE_VERSION, StateDocument};
