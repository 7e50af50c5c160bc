use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Chunking,
    Synthesizing(usize),
    Exporting,
    Tagging,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Chunking => write!(f, "chunking"),
            Stage::Synthesizing(i) => write!(f, "synthesizing chunk {}", i),
            Stage::Exporting => write!(f, "exporting"),
            Stage::Tagging => write!(f, "tagging"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Could not prepare working directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Synthesis engine failed on chunk {chunk_index}{}: {message}", .exit_status.map(|c| format!(" (exit status {})", c)).unwrap_or_default())]
    SynthesisEngineFailure {
        chunk_index: usize,
        exit_status: Option<i32>,
        message: String,
    },

    #[error("Failed to export audio as {format}: {message}")]
    ExportFailure { format: String, message: String },

    #[error("Failed to tag {}: {message}", .path.display())]
    TaggingFailure { path: PathBuf, message: String },
}

impl PipelineError {
    /// Stage the failure belongs to. An artifact that cannot be decoded is
    /// an engine failure, so it reports the synthesizing stage of its chunk.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ConfigurationError(_) | PipelineError::Workspace(_) => Stage::Chunking,
            PipelineError::SynthesisEngineFailure { chunk_index, .. } => {
                Stage::Synthesizing(*chunk_index)
            }
            PipelineError::ExportFailure { .. } => Stage::Exporting,
            PipelineError::TaggingFailure { .. } => Stage::Tagging,
        }
    }

    /// Index of the failing chunk, if the failure is tied to one.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            PipelineError::SynthesisEngineFailure { chunk_index, .. } => Some(*chunk_index),
            _ => None,
        }
    }

    /// Whether the failure leaves a usable output file behind.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::TaggingFailure { .. })
    }

    pub(crate) fn engine(chunk_index: usize, exit_status: Option<i32>, message: impl Into<String>) -> Self {
        PipelineError::SynthesisEngineFailure {
            chunk_index,
            exit_status,
            message: message.into(),
        }
    }

    pub(crate) fn export(format: &str, message: impl Into<String>) -> Self {
        PipelineError::ExportFailure {
            format: format.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn tagging(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::TaggingFailure {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
