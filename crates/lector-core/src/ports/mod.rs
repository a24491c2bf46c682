//! Port definitions (trait abstractions) for external systems.
//!
//! Ports use only domain types. Adapters in `lector-store` implement them;
//! services and HTTP handlers hold them as `Arc<dyn ...>`.

pub mod library;
pub mod session_store;

pub use library::{BookCatalogPort, LibraryError};
pub use session_store::{NewSession, ReaderSessionPort};
