//! Speech playback error types.

use lector_core::ReaderError;

/// Errors that can occur while speaking a chunk.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// The configured TTS program could not be started.
    #[error("Failed to start TTS command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The TTS program exited unsuccessfully.
    #[error("TTS command '{program}' failed: {status}")]
    CommandFailed { program: String, status: String },

    /// Backend specification string could not be parsed.
    #[error("Invalid speech backend '{0}' (expected 'dry-run' or 'command:<program> [args]')")]
    InvalidBackend(String),

    /// Speech synthesis failed inside the backend.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// A blocking store call could not be joined.
    #[error("Background task failed: {0}")]
    Task(String),

    /// The session store rejected or failed an operation.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// IO error while driving a backend process.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
