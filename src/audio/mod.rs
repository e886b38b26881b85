pub mod accumulator;
pub mod backend;
pub mod gate;
pub mod wav;

pub use accumulator::{concat_frames, FrameAccumulator};
pub use backend::{AudioBackend, AudioFrame, CaptureConfig, CpalBackend};
pub use gate::{rms, SilenceGate};
pub use wav::AudioFormat;
