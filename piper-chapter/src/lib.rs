//! piper-chapter - synthesize a chapter of text into one tagged audio file
//! by running Piper TTS chunk by chunk.
//!
//! ```no_run
//! use piper_chapter::{AudioTags, PiperChapterConfig, PiperProvider};
//! use std::path::Path;
//!
//! # async fn demo() -> piper_chapter::Result<()> {
//! let provider = PiperProvider::new(&PiperChapterConfig::load()?);
//! let outcome = provider
//!     .text_to_speech("It was a dark night.", Path::new("ch01.opus"), &AudioTags::new(1, "Night"))
//!     .await?;
//! println!("{} chunks, {:?}", outcome.chunks, outcome.duration);
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod text;
pub mod tts;

pub use audio::{AudioTags, AudioTimeline, Ffmpeg, FfmpegTagWriter, TagWriter};
pub use config::PiperChapterConfig;
pub use error::{PipelineError, Result, Stage};
pub use pipeline::{Pipeline, RunOutcome, SynthesisRequest};
pub use provider::PiperProvider;
pub use text::{TextChunk, split_text};
pub use tts::{PiperEngine, SynthesisEngine, ToneEngine, VoiceConfiguration};
