//! piper-chapter configuration management.

use crate::error::{PipelineError, Result};
use crate::text::DEFAULT_MAX_CHARS;
use crate::tts::piper::DEFAULT_PIPER_PATH;
use crate::tts::{RawVoiceSettings, VoiceConfiguration};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiperChapterConfig {
    /// Path to the piper executable
    #[serde(default = "default_piper_path")]
    pub piper_path: PathBuf,

    /// Path to the ffmpeg executable used for encoding and tagging
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Maximum chunk size in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Forward rate and pause to piper as --length_scale / --sentence_silence
    #[serde(default)]
    pub pass_rate_and_pause: bool,

    /// Voice settings, validated when the pipeline is built
    #[serde(default)]
    pub voice: RawVoiceSettings,
}

fn default_piper_path() -> PathBuf {
    PathBuf::from(DEFAULT_PIPER_PATH)
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for PiperChapterConfig {
    fn default() -> Self {
        Self {
            piper_path: default_piper_path(),
            ffmpeg_path: default_ffmpeg_path(),
            max_chunk_chars: default_max_chunk_chars(),
            pass_rate_and_pause: false,
            voice: RawVoiceSettings::default(),
        }
    }
}

impl PiperChapterConfig {
    /// Get the config file path: ~/.config/cli-programs/piper-chapter.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            PipelineError::ConfigurationError("could not determine home directory".to_string())
        })?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("piper-chapter.toml"))
    }

    /// Load config from the default location, returning defaults if the
    /// file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, returning defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigurationError(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            PipelineError::ConfigurationError(format!("invalid {}: {}", path.display(), e))
        })
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_error = |e: std::io::Error| {
            PipelineError::ConfigurationError(format!("cannot write {}: {}", path.display(), e))
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::ConfigurationError(e.to_string()))?;
        fs::write(path, content).map_err(io_error)
    }

    /// Resolved voice configuration.
    pub fn voice(&self) -> VoiceConfiguration {
        VoiceConfiguration::resolve(&self.voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts::RateValue;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PiperChapterConfig::default();
        assert_eq!(config.piper_path, PathBuf::from("./piper-tts-bin/piper"));
        assert_eq!(config.max_chunk_chars, 1000);
        assert!(!config.pass_rate_and_pause);
        assert_eq!(config.voice(), VoiceConfiguration::default());
    }

    #[test]
    fn test_config_path() {
        if let Ok(path) = PiperChapterConfig::config_path() {
            assert!(path.ends_with("cli-programs/piper-chapter.toml"));
        }
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
piper_path = "/opt/piper/piper"
max_chunk_chars = 500

[voice]
model = "/opt/piper/amy.onnx"
speaker = "1"
rate = "not-a-number"
output_format = "mp3"
"#;
        let config: PiperChapterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.piper_path, PathBuf::from("/opt/piper/piper"));
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
        assert_eq!(config.max_chunk_chars, 500);

        let voice = config.voice();
        assert_eq!(voice.model, "/opt/piper/amy.onnx");
        assert_eq!(voice.rate, 1.0);
        assert_eq!(voice.output_format, "mp3");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: PiperChapterConfig = toml::from_str("").unwrap();
        assert_eq!(config, PiperChapterConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("piper-chapter.toml");

        let mut config = PiperChapterConfig::default();
        config.voice.rate = Some(RateValue::from(1.5));
        config.voice.speaker = Some("4".to_string());
        config.save_to(&path).unwrap();

        let loaded = PiperChapterConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.voice().rate, 1.5);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = PiperChapterConfig::load_from(&temp_dir.path().join("none.toml")).unwrap();
        assert_eq!(config, PiperChapterConfig::default());
    }

    #[test]
    fn test_invalid_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "max_chunk_chars = \"lots\"").unwrap();

        let err = PiperChapterConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, PipelineError::ConfigurationError(_)));
    }
}
