//! Main commands enum.

use clap::Subcommand;

use lector_axum::bootstrap::DEFAULT_PORT;

/// Available `lector` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP reader service
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "LECTOR_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// TTS program run per chunk, text appended as the last argument
        /// (e.g. "espeak-ng -v es", "spd-say --wait")
        #[arg(long, env = "LECTOR_TTS_COMMAND")]
        tts_command: Option<String>,
        /// Simulate playback instead of running a TTS program
        #[arg(long, env = "LECTOR_TTS_DRY_RUN")]
        dry_run: bool,
    },

    /// Print a session snapshot as JSON, straight from the state file
    Status {
        /// Session to show
        session_id: String,
        /// Include the chunk texts
        #[arg(long)]
        chunks: bool,
    },

    /// Show resolved paths for all lector files
    Paths,
}
