//! Simulated playback: sleeps for as long as the text would take to speak.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use lector_core::utils::char_len;

use super::{SpeechBackend, SpeechEnd};
use crate::error::VoiceError;

/// Upper bound on a single simulated playback.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(30);

/// Backend that produces no audio and only simulates its duration.
#[derive(Debug, Clone)]
pub struct DryRunBackend {
    chars_per_second: f64,
    max_duration: Duration,
}

impl DryRunBackend {
    pub const fn new(chars_per_second: f64) -> Self {
        Self {
            chars_per_second,
            max_duration: DEFAULT_MAX_DURATION,
        }
    }

    #[must_use]
    pub const fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Simulated duration for `text`.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_for(&self, text: &str) -> Duration {
        if self.chars_per_second <= 0.0 || !self.chars_per_second.is_finite() {
            return Duration::ZERO;
        }
        let secs = char_len(text) as f64 / self.chars_per_second;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_duration)
            .min(self.max_duration)
    }
}

#[async_trait]
impl SpeechBackend for DryRunBackend {
    async fn speak(
        &self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<SpeechEnd, VoiceError> {
        let duration = self.duration_for(text);
        debug!(chars = char_len(text), ms = duration.as_millis(), "Dry-run playback");

        tokio::select! {
            () = cancel.cancelled() => Ok(SpeechEnd::Cancelled),
            () = tokio::time::sleep(duration) => Ok(SpeechEnd::Finished),
        }
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
