use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// When the recording started
    pub started_at: DateTime<Utc>,

    /// Frames delivered by the capture backend
    pub frames_seen: usize,

    /// Frames classified as signal and accumulated
    pub frames_accepted: usize,

    /// Frames currently accumulated and not yet flushed
    pub pending_frames: usize,

    /// Number of completed flushes
    pub flushes: usize,

    /// Dispatch attempts that failed (batch discarded, session continued)
    pub dispatch_failures: usize,
}
