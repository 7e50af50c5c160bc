//! Audio assembly, encoding and tagging.

pub mod assembler;
pub mod ffmpeg;
pub mod tags;

pub use assembler::AudioTimeline;
pub use ffmpeg::Ffmpeg;
pub use tags::{AudioTags, FfmpegTagWriter, TagWriter};
