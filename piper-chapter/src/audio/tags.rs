//! Chapter metadata written into the finished audio file.

use super::ffmpeg::Ffmpeg;
use crate::error::{PipelineError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Descriptive tags for one chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioTags {
    /// Chapter index, written as the track number
    pub index: usize,
    /// Chapter title
    pub title: String,
    /// Book author, written as the artist
    pub author: Option<String>,
    /// Book title, written as the album
    pub book_title: Option<String>,
}

impl AudioTags {
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            author: None,
            book_title: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_book_title(mut self, book_title: impl Into<String>) -> Self {
        self.book_title = Some(book_title.into());
        self
    }

    /// Key/value pairs in FFmpeg's metadata vocabulary.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("title", self.title.clone()),
            ("track", self.index.to_string()),
        ];
        if let Some(ref author) = self.author {
            fields.push(("artist", author.clone()));
        }
        if let Some(ref book_title) = self.book_title {
            fields.push(("album", book_title.clone()));
        }
        fields.push(("genre", "Audiobook".to_string()));
        fields
    }
}

/// Writes tags into an already-exported audio file.
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Tag the file at `path`, encoded as `format`, in place. A failure must
    /// leave the audio untouched.
    async fn write_tags(&self, path: &Path, format: &str, tags: &AudioTags) -> Result<()>;
}

/// Tag writer that remuxes through FFmpeg with an FFMETADATA1 file.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTagWriter {
    ffmpeg: Ffmpeg,
}

/// Containers with no tag support worth writing.
const UNTAGGABLE: &[&str] = &["wav", "wave", "raw", "pcm"];

impl FfmpegTagWriter {
    pub fn new(ffmpeg: Ffmpeg) -> Self {
        Self { ffmpeg }
    }

    async fn remux(&self, path: &Path, format: &str, tags: &AudioTags) -> anyhow::Result<()> {
        let temp_dir = TempDir::new().context("Failed to create metadata directory")?;
        let metadata_file = temp_dir.path().join("metadata.txt");
        create_ffmpeg_metadata(tags, &metadata_file)?;

        // Same directory so the final rename stays on one filesystem
        let tagged = sibling_path(path);
        if let Err(e) = self
            .ffmpeg
            .remux_with_metadata(path, &metadata_file, &tagged, format)
            .await
        {
            let _ = std::fs::remove_file(&tagged);
            return Err(e);
        }

        if let Err(e) = std::fs::rename(&tagged, path) {
            let _ = std::fs::remove_file(&tagged);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }

        Ok(())
    }
}

#[async_trait]
impl TagWriter for FfmpegTagWriter {
    async fn write_tags(&self, path: &Path, format: &str, tags: &AudioTags) -> Result<()> {
        let format = format.trim().to_ascii_lowercase();
        if format.is_empty() || UNTAGGABLE.contains(&format.as_str()) {
            return Err(PipelineError::tagging(
                path,
                format!("unsupported container '{}'", format),
            ));
        }

        if !path.is_file() {
            return Err(PipelineError::tagging(path, "file does not exist"));
        }

        self.remux(path, &format, tags)
            .await
            .map_err(|e| PipelineError::tagging(path, format!("{:#}", e)))
    }
}

fn sibling_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tagging", name))
}

/// Write an FFMETADATA1 file holding the global tags.
pub fn create_ffmpeg_metadata(tags: &AudioTags, output_path: &Path) -> anyhow::Result<()> {
    let mut file = File::create(output_path).context("Failed to create metadata file")?;

    writeln!(file, ";FFMETADATA1")?;
    for (key, value) in tags.fields() {
        writeln!(file, "{}={}", key, escape_metadata_value(&value))?;
    }

    Ok(())
}

/// Escape special characters in metadata values.
///
/// FFmpeg metadata values need to escape: = ; # \ and newlines
fn escape_metadata_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '=' | ';' | '#' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }

    escaped
}
