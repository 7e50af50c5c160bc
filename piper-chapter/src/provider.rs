//! Piper TTS provider: the entry point used by audiobook generators.

use crate::audio::{AudioTags, Ffmpeg, FfmpegTagWriter};
use crate::config::PiperChapterConfig;
use crate::error::Result;
use crate::pipeline::{Pipeline, RunOutcome, SynthesisRequest};
use crate::tts::{PiperEngine, SynthesisEngine};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Piper runs locally, so synthesis is free.
pub const PRICE_PER_1K_CHARS: f64 = 0.0;

/// Text inserted between paragraphs when chapter text is assembled upstream.
pub const BREAK_STRING: &str = "    ";

pub struct PiperProvider {
    pipeline: Pipeline,
}

impl PiperProvider {
    /// Create a provider running the configured piper executable.
    pub fn new(config: &PiperChapterConfig) -> Self {
        let engine = PiperEngine::new(&config.piper_path)
            .with_rate_and_pause(config.pass_rate_and_pause);
        Self::with_engine(config, Arc::new(engine))
    }

    /// Create a provider around any synthesis engine.
    pub fn with_engine(config: &PiperChapterConfig, engine: Arc<dyn SynthesisEngine>) -> Self {
        let ffmpeg = Ffmpeg::new(&config.ffmpeg_path);
        let pipeline = Pipeline::new(config.voice(), engine)
            .with_tagger(Arc::new(FfmpegTagWriter::new(ffmpeg.clone())))
            .with_ffmpeg(ffmpeg)
            .with_max_chunk_chars(config.max_chunk_chars);
        Self { pipeline }
    }

    /// Nothing to check ahead of time; engine problems surface per chunk.
    pub fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    /// Synthesize `text` into `output_file` and tag it.
    pub async fn text_to_speech(
        &self,
        text: &str,
        output_file: &Path,
        tags: &AudioTags,
    ) -> Result<RunOutcome> {
        let request = SynthesisRequest::new(text, output_file, tags.clone());
        self.pipeline.run(&request).await
    }

    pub fn estimate_cost(&self, total_chars: usize) -> f64 {
        total_chars as f64 / 1000.0 * PRICE_PER_1K_CHARS
    }

    pub fn break_string(&self) -> &'static str {
        BREAK_STRING
    }

    pub fn output_file_extension(&self) -> &str {
        &self.pipeline.voice().output_format
    }
}

impl fmt::Display for PiperProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.pipeline.engine_name(), self.pipeline.voice())
    }
}
