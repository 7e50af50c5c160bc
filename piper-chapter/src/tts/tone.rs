//! Synthetic engine that writes tone-coded WAV files instead of speech.
//!
//! Chunk `i` becomes a sine tone of `i * 110` Hz lasting `i * segment_ms`
//! milliseconds, so the assembled timeline shows which chunk landed where.
//! Used for dry runs and for testing the pipeline without Piper installed.

use super::{SynthesisEngine, VoiceConfiguration};
use crate::error::{PipelineError, Result};
use crate::text::TextChunk;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Sample rate of generated tones.
pub const TONE_SAMPLE_RATE: u32 = 8000;

const AMPLITUDE: f32 = 0.5;

/// One recorded engine call.
#[derive(Debug, Clone)]
pub struct ToneCall {
    pub chunk: TextChunk,
    pub destination: PathBuf,
}

/// Tone generating engine with optional injected failures.
#[derive(Debug, Default)]
pub struct ToneEngine {
    /// Duration unit per chunk index (default 100 ms)
    segment_ms: u32,
    /// Fail on this chunk with this exit status
    fail_at: Option<(usize, i32)>,
    /// Write an undecodable file for this chunk
    corrupt_at: Option<usize>,
    calls: Mutex<Vec<ToneCall>>,
}

impl ToneEngine {
    /// Create an engine that always succeeds.
    pub fn new() -> Self {
        Self {
            segment_ms: 100,
            ..Default::default()
        }
    }

    /// Set the per-index duration unit.
    pub fn with_segment_ms(mut self, segment_ms: u32) -> Self {
        self.segment_ms = segment_ms.max(1);
        self
    }

    /// Fail on `chunk_index` as if the engine exited with `exit_status`.
    pub fn failing_at(mut self, chunk_index: usize, exit_status: i32) -> Self {
        self.fail_at = Some((chunk_index, exit_status));
        self
    }

    /// Write garbage instead of audio for `chunk_index`.
    pub fn corrupt_at(mut self, chunk_index: usize) -> Self {
        self.corrupt_at = Some(chunk_index);
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<ToneCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of samples written for a chunk.
    pub fn sample_count(&self, chunk_index: usize) -> usize {
        (TONE_SAMPLE_RATE as usize * self.segment_ms as usize * chunk_index) / 1000
    }

    /// The exact samples written for a chunk.
    pub fn segment_samples(&self, chunk_index: usize) -> Vec<i16> {
        let frequency = 110.0 * chunk_index as f32;
        (0..self.sample_count(chunk_index))
            .map(|n| {
                let t = n as f32 / TONE_SAMPLE_RATE as f32;
                let s = (2.0 * std::f32::consts::PI * frequency * t).sin() * AMPLITUDE;
                (s * i16::MAX as f32) as i16
            })
            .collect()
    }

    fn write_tone(&self, chunk_index: usize, destination: &Path) -> std::result::Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: TONE_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(destination, spec)?;
        for sample in self.segment_samples(chunk_index) {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

#[async_trait]
impl SynthesisEngine for ToneEngine {
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        _voice: &VoiceConfiguration,
        destination: &Path,
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ToneCall {
                chunk: chunk.clone(),
                destination: destination.to_path_buf(),
            });

        if let Some((index, status)) = self.fail_at {
            if index == chunk.index {
                return Err(PipelineError::engine(
                    chunk.index,
                    Some(status),
                    "tone engine failure requested",
                ));
            }
        }

        if self.corrupt_at == Some(chunk.index) {
            return std::fs::write(destination, b"not a wav file").map_err(|e| {
                PipelineError::engine(chunk.index, None, e.to_string())
            });
        }

        self.write_tone(chunk.index, destination)
            .map_err(|e| PipelineError::engine(chunk.index, None, format!("tone write failed: {}", e)))
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}
