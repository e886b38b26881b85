use std::path::PathBuf;
use std::time::Duration;

use crate::config::PipelineSettings;

/// Runtime parameters for a recording session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// RMS loudness below which a frame is discarded as silence
    pub silence_threshold: f64,

    /// Flush scheduler period
    pub flush_interval: Duration,

    /// Number of accumulated signal frames that makes a flush due.
    /// A frame count, not a duration: silent stretches slow the flush
    /// cadence down with speech density.
    pub chunk_threshold: usize,

    /// Save flushed containers to disk instead of dispatching them
    pub save_partial: bool,

    /// Play the final buffer on shutdown instead of saving it
    pub play_on_exit: bool,

    /// Directory for saved containers
    pub output_dir: PathBuf,

    /// Delay between presented transcript words
    pub word_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&PipelineSettings::default())
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self {
            silence_threshold: settings.silence_threshold,
            flush_interval: Duration::from_millis(settings.flush_interval_ms),
            chunk_threshold: settings.chunk_threshold,
            save_partial: settings.save_partial,
            play_on_exit: settings.play_on_exit,
            output_dir: settings.output_dir.clone(),
            word_delay: Duration::from_millis(settings.word_delay_ms),
        }
    }
}
