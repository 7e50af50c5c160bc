//! FFmpeg invocation for encoding and metadata remuxing.
//!
//! FFmpeg runs as a tokio child process so a long encode never blocks other
//! runs on the same runtime, and is killed if the run is dropped.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Handle on an FFmpeg executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    executable: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        // System ffmpeg from PATH
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Check if FFmpeg can be run.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.executable)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Encode `input` into `output` using the codec for `format`.
    pub async fn encode(&self, input: &Path, output: &Path, format: &str) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["-y", "-i"]).arg(input).args(["-vn"]);
        cmd.args(encoder_args(format)).arg(output);
        run(cmd, "encode").await
    }

    /// Copy `input` to `output` in the container for `format`, with global
    /// metadata taken from an FFMETADATA1 file, without re-encoding.
    pub async fn remux_with_metadata(
        &self,
        input: &Path,
        metadata: &Path,
        output: &Path,
        format: &str,
    ) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["-y", "-i"])
            .arg(input)
            .args(["-i"])
            .arg(metadata)
            .args(["-map", "0:a", "-map_metadata", "1", "-c", "copy", "-f", muxer(format)])
            .arg(output);
        run(cmd, "metadata remux").await
    }
}

/// FFmpeg muxer name for an output format name.
pub fn muxer(format: &str) -> &str {
    match format {
        "opus" | "ogg" => "ogg",
        "m4a" | "m4b" | "aac" | "mp4" => "mp4",
        "wave" => "wav",
        other => other,
    }
}

/// Codec and muxer arguments for an output format name.
pub fn encoder_args(format: &str) -> Vec<String> {
    let codec: &[&str] = match format {
        "opus" => &["-c:a", "libopus", "-b:a", "48k"],
        "ogg" => &["-c:a", "libvorbis", "-q:a", "4"],
        "mp3" => &["-c:a", "libmp3lame", "-q:a", "4"],
        "m4a" | "m4b" | "aac" | "mp4" => &["-c:a", "aac", "-b:a", "128k"],
        "flac" => &["-c:a", "flac"],
        "wav" | "wave" => &["-c:a", "pcm_s16le"],
        _ => &[],
    };
    codec
        .iter()
        .copied()
        .chain(["-f", muxer(format)])
        .map(str::to_string)
        .collect()
}

async fn run(mut cmd: Command, what: &str) -> Result<()> {
    let output = cmd
        .output()
        .await
        .with_context(|| format!("Failed to run ffmpeg {}", what))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg {} failed: {}", what, stderr.trim());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ffmpeg_available() {
        // This test just checks the function doesn't panic
        let _ = Ffmpeg::default().is_available().await;
    }

    #[test]
    fn test_encoder_args() {
        assert_eq!(
            encoder_args("opus"),
            vec!["-c:a", "libopus", "-b:a", "48k", "-f", "ogg"]
        );
        assert_eq!(encoder_args("m4b")[1], "aac");
        assert_eq!(encoder_args("webm"), vec!["-f", "webm"]);
    }

    #[test]
    fn test_muxer() {
        assert_eq!(muxer("opus"), "ogg");
        assert_eq!(muxer("m4b"), "mp4");
        assert_eq!(muxer("mp3"), "mp3");
        assert_eq!(muxer("flac"), "flac");
    }

    #[tokio::test]
    async fn test_missing_executable_fails() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg");
        assert!(!ffmpeg.is_available().await);
        let err = ffmpeg
            .encode(Path::new("in.wav"), Path::new("out.mp3"), "mp3")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to run ffmpeg encode"));
    }
}
