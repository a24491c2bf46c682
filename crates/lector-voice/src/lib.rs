//! Speech playback for lector's reader mode.
//!
//! Backends speak text; the [`ReaderSpeaker`] runs one cancellable stream per
//! session on top of them and turns stream endings into autocommits.

pub mod backend;
pub mod error;
pub mod speaker;

pub use backend::{CommandBackend, DryRunBackend, SpeechBackend, SpeechBackendConfig, SpeechEnd};
pub use error::VoiceError;
pub use speaker::{
    CAUSE_BARGE_IN, CAUSE_STOPPED, CAUSE_SUPERSEDED, InterruptedStream, ReaderSpeaker,
};
