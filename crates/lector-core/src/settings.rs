//! Reader settings and validation.
//!
//! Tunables for bookmark estimation, autocommit timeouts, continuous mode and
//! chunking. Defaults can be overridden with `LECTOR_*` environment variables.

use serde::{Deserialize, Serialize};

/// Default speech rate used for bookmark estimation and dry-run playback.
pub const DEFAULT_SPEECH_CHARS_PER_SECOND: f64 = 15.0;

/// Default wall-clock window before a stream is finalized as timed out.
pub const DEFAULT_AUTOCOMMIT_TIMEOUT_MS: u64 = 120_000;

/// Default pause between chunks in continuous mode.
pub const DEFAULT_CONTINUOUS_GAP_MS: u64 = 350;

/// Default chunk size for books from the library.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 900;

/// Reader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Assumed speech rate in characters per second.
    pub speech_chars_per_second: f64,

    /// Timeout for a playback stream, in milliseconds.
    pub autocommit_timeout_ms: u64,

    /// Commit the chunk anyway when a stream times out.
    pub commit_on_timeout: bool,

    /// Pause between chunks in continuous mode, in milliseconds.
    pub continuous_gap_ms: u64,

    /// Maximum characters per chunk when splitting library books.
    pub max_chunk_chars: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            speech_chars_per_second: DEFAULT_SPEECH_CHARS_PER_SECOND,
            autocommit_timeout_ms: DEFAULT_AUTOCOMMIT_TIMEOUT_MS,
            commit_on_timeout: true,
            continuous_gap_ms: DEFAULT_CONTINUOUS_GAP_MS,
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl ReaderSettings {
    /// Defaults overridden by `LECTOR_*` environment variables, validated.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (key, v))
        };

        if let Some((key, v)) = get("LECTOR_SPEECH_CHARS_PER_SECOND") {
            settings.speech_chars_per_second = parse(key, &v)?;
        }
        if let Some((key, v)) = get("LECTOR_AUTOCOMMIT_TIMEOUT_MS") {
            settings.autocommit_timeout_ms = parse(key, &v)?;
        }
        if let Some((key, v)) = get("LECTOR_COMMIT_ON_TIMEOUT") {
            settings.commit_on_timeout = parse_bool(key, &v)?;
        }
        if let Some((key, v)) = get("LECTOR_CONTINUOUS_GAP_MS") {
            settings.continuous_gap_ms = parse(key, &v)?;
        }
        if let Some((key, v)) = get("LECTOR_MAX_CHUNK_CHARS") {
            settings.max_chunk_chars = parse(key, &v)?;
        }

        validate_settings(&settings)?;
        Ok(settings)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Accepts the usual truthy / falsy spellings.
pub fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Speech rate must be between 1 and 100 chars/s, got {0}")]
    InvalidSpeechRate(f64),

    #[error("Autocommit timeout must be greater than zero")]
    InvalidTimeout,

    #[error("Max chunk chars must be between 40 and 20,000, got {0}")]
    InvalidChunkSize(usize),
}

/// Validate settings values.
pub fn validate_settings(settings: &ReaderSettings) -> Result<(), SettingsError> {
    let rate = settings.speech_chars_per_second;
    if !rate.is_finite() || !(1.0..=100.0).contains(&rate) {
        return Err(SettingsError::InvalidSpeechRate(rate));
    }

    if settings.autocommit_timeout_ms == 0 {
        return Err(SettingsError::InvalidTimeout);
    }

    if !(40..=20_000).contains(&settings.max_chunk_chars) {
        return Err(SettingsError::InvalidChunkSize(settings.max_chunk_chars));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = ReaderSettings::default();
        assert!((settings.speech_chars_per_second - 15.0).abs() < f64::EPSILON);
        assert_eq!(settings.autocommit_timeout_ms, 120_000);
        assert!(settings.commit_on_timeout);
        assert_eq!(settings.continuous_gap_ms, 350);
        assert_eq!(settings.max_chunk_chars, 900);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let settings = ReaderSettings::from_lookup(lookup(&[
            ("LECTOR_AUTOCOMMIT_TIMEOUT_MS", "5000"),
            ("LECTOR_COMMIT_ON_TIMEOUT", "off"),
            ("LECTOR_MAX_CHUNK_CHARS", " 400 "),
        ]))
        .unwrap();
        assert_eq!(settings.autocommit_timeout_ms, 5000);
        assert!(!settings.commit_on_timeout);
        assert_eq!(settings.max_chunk_chars, 400);
    }

    #[test]
    fn test_invalid_number() {
        let err = ReaderSettings::from_lookup(lookup(&[("LECTOR_CONTINUOUS_GAP_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                key: "LECTOR_CONTINUOUS_GAP_MS",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let settings = ReaderSettings {
            autocommit_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_validate_speech_rate() {
        let settings = ReaderSettings {
            speech_chars_per_second: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidSpeechRate(_))
        ));
    }

    #[test]
    fn test_validate_chunk_size() {
        let settings = ReaderSettings {
            max_chunk_chars: 10,
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidChunkSize(10))
        ));
    }
}
