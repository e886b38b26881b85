pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod session;
pub mod storage;
pub mod transcribe;

pub use audio::{
    concat_frames, rms, AudioBackend, AudioFormat, AudioFrame, CaptureConfig, CpalBackend,
    FrameAccumulator, SilenceGate,
};
pub use config::Config;
pub use error::{Result, SottoError};
pub use session::{Phase, RecorderSession, SessionConfig, SessionStats};
pub use transcribe::TranscriptionClient;
