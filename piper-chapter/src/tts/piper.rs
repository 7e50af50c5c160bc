//! Piper TTS backend, run as one child process per chunk.
//!
//! Piper reads the text to speak on stdin and writes a WAV file to the path
//! given with `-f`.

use super::{SynthesisEngine, VoiceConfiguration};
use crate::error::{PipelineError, Result};
use crate::text::TextChunk;
use async_trait::async_trait;
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Where the Piper release archive is unpacked by default.
pub const DEFAULT_PIPER_PATH: &str = "./piper-tts-bin/piper";

/// Piper TTS backend.
#[derive(Debug, Clone)]
pub struct PiperEngine {
    /// Path to the piper executable
    executable: PathBuf,
    /// Pass `--length_scale` and `--sentence_silence` derived from the voice
    pass_rate_and_pause: bool,
}

impl Default for PiperEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PIPER_PATH)
    }
}

impl PiperEngine {
    /// Create a backend running the given executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            pass_rate_and_pause: false,
        }
    }

    /// Forward the voice's rate and pause to Piper.
    pub fn with_rate_and_pause(mut self, enabled: bool) -> Self {
        self.pass_rate_and_pause = enabled;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Command-line arguments for one invocation.
    pub fn args(&self, voice: &VoiceConfiguration, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--model".into(),
            voice.model.clone().into(),
            "--speaker".into(),
            voice.speaker.clone().into(),
        ];

        if self.pass_rate_and_pause {
            args.extend([
                "--sentence_silence".into(),
                voice.pause_secs.to_string().into(),
                "--length_scale".into(),
                voice.length_scale().to_string().into(),
            ]);
        }

        args.push("-f".into());
        args.push(destination.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl SynthesisEngine for PiperEngine {
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceConfiguration,
        destination: &Path,
    ) -> Result<()> {
        debug!(
            "Running {} for chunk {} -> {}",
            self.executable.display(),
            chunk.index,
            destination.display()
        );

        let mut child = Command::new(&self.executable)
            .args(self.args(voice, destination))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PipelineError::engine(
                    chunk.index,
                    None,
                    format!("failed to launch {}: {}", self.executable.display(), e),
                )
            })?;

        // Write input to stdin, then close it so piper sees EOF
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(chunk.text.as_bytes()).await,
            None => Ok(()),
        };

        let output = child.wait_with_output().await.map_err(|e| {
            PipelineError::engine(chunk.index, None, format!("failed to wait for piper: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::engine(
                chunk.index,
                output.status.code(),
                format!("piper failed: {}", stderr.trim()),
            ));
        }

        if let Err(e) = write_result {
            return Err(PipelineError::engine(
                chunk.index,
                output.status.code(),
                format!("failed to write text to piper: {}", e),
            ));
        }

        if !destination.is_file() {
            return Err(PipelineError::engine(
                chunk.index,
                output.status.code(),
                format!("piper exited without writing {}", destination.display()),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "piper"
    }
}
