//! Synthesis engine trait and voice settings.

pub mod piper;
pub mod tone;
pub mod voice;

pub use piper::PiperEngine;
pub use tone::ToneEngine;
pub use voice::{RateValue, RawVoiceSettings, VoiceConfiguration};

use crate::error::Result;
use crate::text::TextChunk;
use async_trait::async_trait;
use std::path::Path;

/// A speech engine that turns one chunk of text into one audio file.
///
/// Implementations must not return before the audio at `destination` is
/// complete; the pipeline decodes it immediately afterwards.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Synthesize `chunk` into a WAV file at `destination`.
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice: &VoiceConfiguration,
        destination: &Path,
    ) -> Result<()>;

    /// Engine name for display.
    fn name(&self) -> &'static str;
}
