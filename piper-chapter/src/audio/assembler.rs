//! In-memory audio timeline built from per-chunk WAV files.

use super::ffmpeg::Ffmpeg;
use crate::error::{PipelineError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;
use std::time::Duration;

/// Format used when nothing has been appended yet.
pub const EMPTY_SAMPLE_RATE: u32 = 22050;

/// Input frames per resampler block.
const RESAMPLE_CHUNK: usize = 1024;

/// Sample rate and channel count of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Ordered concatenation of decoded audio segments.
///
/// The first appended segment fixes the format; later segments are
/// converted to it. Samples are interleaved 16-bit PCM.
#[derive(Debug, Default)]
pub struct AudioTimeline {
    format: Option<PcmFormat>,
    samples: Vec<i16>,
    segments: usize,
}

impl AudioTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(&self) -> PcmFormat {
        self.format.unwrap_or(PcmFormat {
            sample_rate: EMPTY_SAMPLE_RATE,
            channels: 1,
        })
    }

    /// Number of segments appended so far.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Total duration of the timeline.
    pub fn duration(&self) -> Duration {
        let format = self.format();
        frames_to_duration(self.samples.len() / format.channels as usize, format.sample_rate)
    }

    /// Decode a WAV file and append it to the end of the timeline.
    ///
    /// Returns the duration of the appended segment. On error the timeline is
    /// left unchanged.
    pub fn append(&mut self, path: &Path) -> anyhow::Result<Duration> {
        let mut reader = WavReader::open(path)?;
        let spec = reader.spec();
        let decoded = decode_samples(&mut reader, spec)?;

        let source = PcmFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels.max(1),
        };
        let target = self.format.unwrap_or(source);

        let mixed = convert_channels(decoded, source.channels, target.channels);
        let converted = resample(mixed, target.channels, source.sample_rate, target.sample_rate)?;

        self.format = Some(target);
        let frames = converted.len() / target.channels as usize;
        self.samples.extend_from_slice(&converted);
        self.segments += 1;

        Ok(frames_to_duration(frames, target.sample_rate))
    }

    /// Write the timeline as a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> std::result::Result<(), hound::Error> {
        let format = self.format();
        let spec = WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }

    /// Write the whole timeline to `target` in `format`.
    ///
    /// WAV is written directly. Other formats are staged as WAV in
    /// `staging_dir` and encoded with FFmpeg. Nothing is left at `target` on
    /// failure.
    pub async fn export(
        &self,
        target: &Path,
        format: &str,
        ffmpeg: &Ffmpeg,
        staging_dir: &Path,
    ) -> Result<()> {
        let result = if is_wav(format) {
            self.write_wav(target).map_err(anyhow::Error::from)
        } else {
            let staging = staging_dir.join("timeline.wav");
            match self.write_wav(&staging) {
                Ok(()) => ffmpeg.encode(&staging, target, format).await,
                Err(e) => Err(e.into()),
            }
        };

        result.map_err(|e| {
            let _ = std::fs::remove_file(target);
            PipelineError::export(format, format!("{:#}", e))
        })
    }
}

fn is_wav(format: &str) -> bool {
    matches!(format, "wav" | "wave")
}

fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    let frames = frames as u64;
    let rate = sample_rate.max(1) as u64;
    Duration::from_secs(frames / rate) + Duration::from_nanos(frames % rate * 1_000_000_000 / rate)
}

fn decode_samples<R: std::io::Read>(
    reader: &mut WavReader<R>,
    spec: WavSpec,
) -> std::result::Result<Vec<i16>, hound::Error> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect(),
        (SampleFormat::Int, bits) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| scale_to_16_bits(v, bits)))
            .collect(),
    }
}

/// Rescale an integer sample of `bits` width to full 16-bit range.
fn scale_to_16_bits(sample: i32, bits: u16) -> i16 {
    if bits < 16 {
        (sample << (16 - bits)) as i16
    } else {
        (sample >> (bits - 16)) as i16
    }
}

/// Up- or down-mix interleaved samples to a different channel count.
fn convert_channels(samples: Vec<i16>, from: u16, to: u16) -> Vec<i16> {
    if from == to {
        return samples;
    }

    let from = from as usize;
    let to = to as usize;
    let mut out = Vec::with_capacity(samples.len() / from * to);

    for frame in samples.chunks_exact(from) {
        if to == 1 {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            out.push((sum / from as i32) as i16);
        } else {
            out.extend((0..to).map(|ch| frame[ch.min(from - 1)]));
        }
    }

    out
}

/// Band-limited resampling of interleaved samples with rubato.
///
/// The output has exactly `frames * to_rate / from_rate` frames, aligned with
/// the input (the filter delay is trimmed off).
fn resample(
    samples: Vec<i16>,
    channels: u16,
    from_rate: u32,
    to_rate: u32,
) -> anyhow::Result<Vec<i16>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples);
    }

    let channels = channels as usize;
    let in_frames = samples.len() / channels;
    let out_frames = (in_frames as u64 * to_rate as u64 / from_rate as u64) as usize;

    let mut planar = vec![Vec::with_capacity(in_frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            planar[ch].push(s as f64 / 32768.0);
        }
    }

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, RESAMPLE_CHUNK, 2, channels)?;
    let delay = resampler.output_delay();
    let mut resampled: Vec<Vec<f64>> = vec![Vec::with_capacity(delay + out_frames); channels];

    let mut pos = 0;
    while in_frames - pos >= resampler.input_frames_next() {
        let end = pos + resampler.input_frames_next();
        let block: Vec<&[f64]> = planar.iter().map(|c| &c[pos..end]).collect();
        extend_planar(&mut resampled, resampler.process(&block, None)?);
        pos = end;
    }
    if pos < in_frames {
        let block: Vec<&[f64]> = planar.iter().map(|c| &c[pos..]).collect();
        extend_planar(&mut resampled, resampler.process_partial(Some(&block), None)?);
    }
    // Flush the filter tail
    while resampled[0].len() < delay + out_frames {
        extend_planar(
            &mut resampled,
            resampler.process_partial(None::<&[Vec<f64>]>, None)?,
        );
    }

    let mut out = Vec::with_capacity(out_frames * channels);
    for frame in delay..delay + out_frames {
        for channel in &resampled {
            let v = (channel[frame] * 32768.0).round().clamp(i16::MIN as f64, i16::MAX as f64);
            out.push(v as i16);
        }
    }

    Ok(out)
}

fn extend_planar(into: &mut [Vec<f64>], block: Vec<Vec<f64>>) {
    for (channel, samples) in into.iter_mut().zip(block) {
        channel.extend(samples);
    }
}
