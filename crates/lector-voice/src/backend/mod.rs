//! Speech backends: engine-agnostic interface for speaking one chunk.
//!
//! The [`ReaderSpeaker`](crate::speaker::ReaderSpeaker) drives a
//! `dyn SpeechBackend` so that playback engines can be swapped without
//! touching stream bookkeeping or autocommit.
//!
//! | Backend              | Module        | Use                                  |
//! |----------------------|---------------|--------------------------------------|
//! | [`DryRunBackend`]    | [`dry_run`]   | tests, machines without a TTS engine |
//! | [`CommandBackend`]   | [`command`]   | `espeak-ng`, `say`, `spd-say --wait` |

pub mod command;
pub mod dry_run;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::VoiceError;

pub use command::CommandBackend;
pub use dry_run::DryRunBackend;

// ── Shared types ───────────────────────────────────────────────────

/// How a `speak` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEnd {
    /// The whole text was spoken.
    Finished,
    /// The cancellation token fired before the text was finished.
    Cancelled,
}

// ── Speech Backend Trait ───────────────────────────────────────────

/// Backend-agnostic text-to-speech playback.
///
/// `speak` resolves when playback ends. Implementations must watch `cancel`
/// and return [`SpeechEnd::Cancelled`] promptly once it fires.
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn speak(&self, text: &str, cancel: CancellationToken)
    -> Result<SpeechEnd, VoiceError>;

    /// Short name for logs and status output.
    fn name(&self) -> &str;
}

// ── Backend selection ──────────────────────────────────────────────

/// Which backend to build, parsed from `dry-run` or `command:<program> [args…]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeechBackendConfig {
    #[default]
    DryRun,
    Command { program: String, args: Vec<String> },
}

impl SpeechBackendConfig {
    /// Build the backend. `chars_per_second` paces the dry-run backend.
    pub fn build(&self, chars_per_second: f64) -> Arc<dyn SpeechBackend> {
        match self {
            Self::DryRun => Arc::new(DryRunBackend::new(chars_per_second)),
            Self::Command { program, args } => {
                Arc::new(CommandBackend::new(program.clone(), args.clone()))
            }
        }
    }
}

impl FromStr for SpeechBackendConfig {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "dry-run" | "dry_run" | "dryrun" => return Ok(Self::DryRun),
            _ => {}
        }

        let invalid = || VoiceError::InvalidBackend(trimmed.to_string());
        let command = trimmed.strip_prefix("command:").ok_or_else(invalid)?;
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(invalid)?;
        Ok(Self::Command {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for SpeechBackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Command { program, args } if args.is_empty() => write!(f, "command:{program}"),
            Self::Command { program, args } => write!(f, "command:{program} {}", args.join(" ")),
        }
    }
}
