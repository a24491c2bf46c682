//! Serve command handler.

use anyhow::{Context, Result};
use lector_axum::{ServerConfig, start_server};
use lector_core::{ReaderSettings, ResolvedPaths};
use lector_voice::SpeechBackendConfig;
use tracing::info;

/// Pick the speech backend from the `serve` flags.
///
/// `--dry-run` wins; otherwise `--tts-command` (with or without the
/// `command:` prefix) runs an external program; neither means dry-run.
pub fn speech_config(tts_command: Option<&str>, dry_run: bool) -> Result<SpeechBackendConfig> {
    match tts_command.map(str::trim) {
        _ if dry_run => Ok(SpeechBackendConfig::DryRun),
        Some(raw) if !raw.is_empty() => {
            let spec = if raw.starts_with("command:") {
                raw.to_string()
            } else {
                format!("command:{raw}")
            };
            spec.parse()
                .with_context(|| format!("Invalid --tts-command '{raw}'"))
        }
        _ => Ok(SpeechBackendConfig::DryRun),
    }
}

pub async fn execute(
    paths: ResolvedPaths,
    port: u16,
    tts_command: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let settings = ReaderSettings::from_env().context("Invalid reader settings")?;
    let speech = speech_config(tts_command, dry_run)?;
    info!(port, speech = %speech, "Starting lector");

    let config = ServerConfig {
        port,
        paths,
        settings,
        speech,
        cors: lector_axum::CorsConfig::default(),
    };
    start_server(config).await
}
