//! External TTS program backend.
//!
//! Runs `<program> [args…] <text>` and treats the process exit as the end of
//! playback, so the program must block until speech is done (`espeak-ng`,
//! `say`, `spd-say --wait`). Cancellation sends SIGTERM and escalates to
//! SIGKILL after a short grace period.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{SpeechBackend, SpeechEnd};
use crate::error::VoiceError;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period between SIGTERM and SIGKILL.
const TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Backend that shells out to a TTS program for each chunk.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn spawn(&self, text: &str) -> Result<Child, VoiceError> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| VoiceError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

#[async_trait]
impl SpeechBackend for CommandBackend {
    async fn speak(
        &self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<SpeechEnd, VoiceError> {
        let mut child = self.spawn(text)?;
        debug!(program = %self.program, pid = ?child.id(), "Spawned TTS command");

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(SpeechEnd::Finished)
                } else {
                    Err(VoiceError::CommandFailed {
                        program: self.program.clone(),
                        status: status.to_string(),
                    })
                }
            }
            () = cancel.cancelled() => {
                if let Err(e) = terminate(&mut child).await {
                    warn!(program = %self.program, error = %e, "Failed to stop TTS command");
                }
                Ok(SpeechEnd::Cancelled)
            }
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(unix)]
async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(pid), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        return result;
    }

    child.kill().await?;
    child.wait().await
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    child.kill().await?;
    child.wait().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let backend = CommandBackend::new("lector-no-such-tts-program", Vec::new());
        let err = backend
            .speak("hola", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Spawn { .. }));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn successful_exit_is_finished() {
        let backend = CommandBackend::new("true", Vec::new());
        let end = backend.speak("hola", CancellationToken::new()).await.unwrap();
        assert_eq!(end, SpeechEnd::Finished);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn failing_exit_is_an_error() {
        let backend = CommandBackend::new("false", Vec::new());
        let err = backend
            .speak("hola", CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::CommandFailed { .. }));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn cancellation_stops_the_process() {
        // The text lands in $0 and is ignored.
        let backend = CommandBackend::new("sh", vec!["-c".into(), "sleep 30".into()]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let end = tokio::time::timeout(Duration::from_secs(5), backend.speak("hola", cancel))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(end, SpeechEnd::Cancelled);
    }
}
