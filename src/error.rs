//! Error types for sotto.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SottoError {
    // Capture errors (fatal at startup)
    #[error("Audio input device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    Capture { message: String },

    // Dispatch errors (recoverable, session continues)
    #[error("Transcription request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transcription API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Playback errors (recoverable, shutdown still terminates)
    #[error("Playback failed: {message}")]
    Playback { message: String },

    // Should be unreachable for well-formed payloads
    #[error("WAV encoding failed: {0}")]
    Encoding(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, SottoError>;
