//! HTTP control plane for lector's reader mode.
//!
//! [`bootstrap`] wires one store, library, coordinator and speaker;
//! [`create_router`] exposes them under `/api/reader/*`.

pub mod bootstrap;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-export primary types
pub use bootstrap::{AxumContext, CorsConfig, ServerConfig, bootstrap, start_server};
pub use error::HttpError;
pub use routes::create_router;
pub use state::AppState;
