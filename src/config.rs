use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureSettings,
    pub pipeline: PipelineSettings,
    pub transcription: TranscriptionSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CaptureSettings {
    /// Input device name substring; unset selects the system default
    pub device: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// RMS loudness below which a frame is discarded as silence
    pub silence_threshold: f64,
    /// Flush scheduler period in milliseconds
    pub flush_interval_ms: u64,
    /// Number of accumulated signal frames that makes a flush due
    pub chunk_threshold: usize,
    /// Save flushed containers to disk instead of dispatching them
    pub save_partial: bool,
    /// Play the final buffer on shutdown instead of saving it
    pub play_on_exit: bool,
    /// Directory for saved containers
    pub output_dir: PathBuf,
    /// Delay between presented transcript words, in milliseconds
    pub word_delay_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            silence_threshold: 2.0,
            flush_interval_ms: 1000,
            chunk_threshold: 90,
            save_partial: false,
            play_on_exit: false,
            output_dir: PathBuf::from("wavs"),
            word_delay_ms: 80,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the bearer credential
    pub api_key_env: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from an optional file; every setting has a
    /// default so a missing file is fine.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
