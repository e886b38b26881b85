//! Recording session management
//!
//! This module provides the `RecorderSession` abstraction that manages:
//! - Silence-gated audio capture from a backend
//! - Frame accumulation and scheduled flushing into WAV containers
//! - Dispatch to the transcription service or persistence to disk
//! - The shutdown state machine and the last-good container
//! - Session statistics

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::{Phase, RecorderSession};
pub use stats::SessionStats;
