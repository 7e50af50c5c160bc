//! Chapter synthesis pipeline: chunk, synthesize, assemble, export, tag.
//!
//! Chunks are synthesized strictly one after another. Each run works inside
//! its own temporary directory, which is removed on every exit path
//! (including when the run's future is dropped), so independent runs can
//! proceed concurrently on a shared `Pipeline`.

use crate::audio::{AudioTags, AudioTimeline, Ffmpeg, FfmpegTagWriter, TagWriter};
use crate::error::{PipelineError, Result};
use crate::text::{DEFAULT_MAX_CHARS, split_text};
use crate::tts::{SynthesisEngine, VoiceConfiguration};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// One chapter to synthesize.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub output: PathBuf,
    pub tags: AudioTags,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, output: impl Into<PathBuf>, tags: AudioTags) -> Self {
        Self {
            text: text.into(),
            output: output.into(),
            tags,
        }
    }
}

/// Result of a run that produced an output file.
#[derive(Debug)]
pub struct RunOutcome {
    /// Path of the exported audio
    pub output: PathBuf,
    /// Number of chunks synthesized
    pub chunks: usize,
    /// Duration of the exported audio
    pub duration: Duration,
    /// Tagging result; a failure here leaves the audio usable
    pub tagging: Result<()>,
}

impl RunOutcome {
    pub fn is_tagged(&self) -> bool {
        self.tagging.is_ok()
    }

    /// Treat a tagging failure as an error.
    pub fn into_result(self) -> Result<PathBuf> {
        self.tagging.map(|()| self.output)
    }
}

/// Drives chapter runs against one engine and voice.
pub struct Pipeline {
    voice: VoiceConfiguration,
    engine: Arc<dyn SynthesisEngine>,
    tagger: Arc<dyn TagWriter>,
    ffmpeg: Ffmpeg,
    max_chunk_chars: usize,
    temp_root: Option<PathBuf>,
}

impl Pipeline {
    /// Create a pipeline using FFmpeg from PATH for encoding and tagging.
    pub fn new(voice: VoiceConfiguration, engine: Arc<dyn SynthesisEngine>) -> Self {
        Self {
            voice,
            engine,
            tagger: Arc::new(FfmpegTagWriter::default()),
            ffmpeg: Ffmpeg::default(),
            max_chunk_chars: DEFAULT_MAX_CHARS,
            temp_root: None,
        }
    }

    pub fn with_tagger(mut self, tagger: Arc<dyn TagWriter>) -> Self {
        self.tagger = tagger;
        self
    }

    pub fn with_ffmpeg(mut self, ffmpeg: Ffmpeg) -> Self {
        self.ffmpeg = ffmpeg;
        self
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    /// Create per-run working directories under `root` instead of the
    /// system temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn voice(&self) -> &VoiceConfiguration {
        &self.voice
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Synthesize one chapter into `request.output`.
    ///
    /// Fatal failures leave nothing at the output path. A tagging failure is
    /// reported in the returned outcome instead.
    pub async fn run(&self, request: &SynthesisRequest) -> Result<RunOutcome> {
        let workspace = self.workspace()?;
        debug!("created temporary directory {}", workspace.path().display());

        let result = self.run_in(request, workspace.path()).await;

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!(
                "Failed to remove temporary directory {}: {}",
                workspace_path.display(),
                e
            );
        }

        if let Err(ref e) = result {
            error!(
                "chapter-{} <{}> failed while {}: {}",
                request.tags.index,
                request.tags.title,
                e.stage(),
                e
            );
        }

        result
    }

    fn workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("piper-chapter-");

        let dir = match self.temp_root {
            Some(ref root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(PipelineError::Workspace)
    }

    async fn run_in(&self, request: &SynthesisRequest, workdir: &Path) -> Result<RunOutcome> {
        let tags = &request.tags;

        let chunks = split_text(&request.text, self.max_chunk_chars, &self.voice.language);
        let total = chunks.len();
        debug!(
            "chapter-{} split into {} chunk(s) of at most {} characters",
            tags.index, total, self.max_chunk_chars
        );

        let mut timeline = AudioTimeline::new();
        for chunk in &chunks {
            info!(
                "Processing chapter-{} <{}>, chunk {} of {}",
                tags.index, tags.title, chunk.index, total
            );

            let artifact = workdir.join(format!("piper{}.wav", chunk.index));
            self.engine.synthesize(chunk, &self.voice, &artifact).await?;

            debug!("assembling chunk {}: {}", chunk.index, artifact.display());
            let segment = timeline.append(&artifact).map_err(|e| {
                PipelineError::engine(
                    chunk.index,
                    None,
                    format!("undecodable audio in {}: {:#}", artifact.display(), e),
                )
            })?;
            debug!(
                "chunk {} added {:.2}s, timeline now {:.2}s",
                chunk.index,
                segment.as_secs_f64(),
                timeline.duration().as_secs_f64()
            );
        }

        if total == 0 {
            info!(
                "chapter-{} <{}> has no text, writing empty audio",
                tags.index, tags.title
            );
        }

        let format = &self.voice.output_format;
        timeline
            .export(&request.output, format, &self.ffmpeg, workdir)
            .await?;
        info!(
            "Exported {} ({:.1}s)",
            request.output.display(),
            timeline.duration().as_secs_f64()
        );

        let tagging = self.tagger.write_tags(&request.output, format, tags).await;
        if let Err(ref e) = tagging {
            warn!("Output is untagged: {}", e);
        }

        Ok(RunOutcome {
            output: request.output.clone(),
            chunks: total,
            duration: timeline.duration(),
            tagging,
        })
    }
}
