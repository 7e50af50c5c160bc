//! Voice settings: raw values as written by the user, and the resolved
//! configuration the engine runs with.

use log::error;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MODEL: &str = "en_US-lessac-medium.onnx";
pub const DEFAULT_SPEAKER: &str = "0";
pub const DEFAULT_RATE: f64 = 1.0;
pub const DEFAULT_PAUSE_SECS: f64 = 0.2;
pub const DEFAULT_OUTPUT_FORMAT: &str = "opus";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Speech rate as written in a config file or on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RateValue {
    fn from(value: f64) -> Self {
        RateValue::Number(value)
    }
}

impl From<&str> for RateValue {
    fn from(value: &str) -> Self {
        RateValue::Text(value.to_string())
    }
}

/// Voice fields before validation. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawVoiceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<RateValue>,
    /// Pause between sentences, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Resolved synthesis parameters. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfiguration {
    /// Piper model (.onnx) path or name
    pub model: String,
    /// Speaker id within a multi-speaker model
    pub speaker: String,
    /// Speech-rate multiplier, always positive and finite
    pub rate: f64,
    /// Pause between sentences in seconds, always positive and finite
    pub pause_secs: f64,
    /// Output container/codec, lowercase (e.g. "opus", "mp3", "wav")
    pub output_format: String,
    /// Language code used for text chunking
    pub language: String,
}

impl Default for VoiceConfiguration {
    fn default() -> Self {
        Self::resolve(&RawVoiceSettings::default())
    }
}

impl VoiceConfiguration {
    /// Normalize raw settings, substituting defaults for missing or invalid
    /// values. An unusable rate is logged and replaced, never returned as an
    /// error.
    pub fn resolve(raw: &RawVoiceSettings) -> Self {
        Self {
            model: non_empty(raw.model.as_deref()).unwrap_or(DEFAULT_MODEL).to_string(),
            speaker: non_empty(raw.speaker.as_deref()).unwrap_or(DEFAULT_SPEAKER).to_string(),
            rate: resolve_rate(raw.rate.as_ref()),
            pause_secs: raw
                .pause
                .filter(|p| p.is_finite() && *p > 0.0)
                .unwrap_or(DEFAULT_PAUSE_SECS),
            output_format: non_empty(raw.output_format.as_deref())
                .unwrap_or(DEFAULT_OUTPUT_FORMAT)
                .to_ascii_lowercase(),
            language: non_empty(raw.language.as_deref())
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
        }
    }

    /// Piper's length scale: larger is slower.
    pub fn length_scale(&self) -> f64 {
        1.0 / self.rate
    }
}

impl fmt::Display for VoiceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model={}, speaker={}, rate={}, pause={}s, format={}, language={}",
            self.model, self.speaker, self.rate, self.pause_secs, self.output_format, self.language
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_rate(rate: Option<&RateValue>) -> f64 {
    let parsed = match rate {
        None => return DEFAULT_RATE,
        Some(RateValue::Number(n)) => Some(*n),
        Some(RateValue::Text(s)) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => {
            error!("Invalid voice rate {:?}, using {}", rate, DEFAULT_RATE);
            DEFAULT_RATE
        }
    }
}
