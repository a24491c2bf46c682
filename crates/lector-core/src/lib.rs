//! Core domain for lector's reader mode.
//!
//! Holds the session record and result types, the error taxonomy, the ports
//! implemented by `lector-store`, the autocommit coordinator, and text, path
//! and settings helpers. No I/O adapters live here.

pub mod domain;
pub mod error;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;
pub mod utils;

// Re-export commonly used types for convenience
pub use domain::{
    BargeIn, BargeInResult, BookEntry, BookFormat, Bookmark, CommitResult, DeliveredChunk,
    ModeResult, NextOutcome, PendingChunk, ReaderState, RewindResult, RewindUnit, SeekOutcome,
    SessionRecord, SessionSnapshot, StartResult, book_id_for,
};
pub use error::{ReaderError, StorageError};
pub use paths::{PathError, ResolvedPaths};
pub use ports::{BookCatalogPort, LibraryError, NewSession, ReaderSessionPort};
pub use services::{AutocommitCoordinator, FinalizeOutcome, StreamId, is_interrupt_cause};
pub use settings::{ReaderSettings, SettingsError, validate_settings};
