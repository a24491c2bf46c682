//! Command handlers.
//!
//! Each handler resolves what it needs from the global flags, calls into the
//! store or the HTTP adapter, and formats the result for the terminal.

pub mod paths;
pub mod serve;
pub mod status;
