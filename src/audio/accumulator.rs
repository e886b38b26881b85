//! Signal frame accumulation between flushes.

/// Ordered buffer of accepted (non-silent) frames.
///
/// Appended by the capture task, drained atomically by the flush scheduler.
/// Frames only ever leave as a whole batch; a flush attempt below threshold
/// leaves the buffer untouched.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    frames: Vec<Vec<i16>>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Adds a signal frame at the tail, preserving arrival order.
    pub fn append(&mut self, samples: Vec<i16>) {
        self.frames.push(samples);
    }

    /// Number of frames currently held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drains and returns all accumulated frames if at least `threshold`
    /// of them have been collected, resetting the buffer to empty.
    /// Below threshold nothing is removed and `None` is returned.
    pub fn try_flush(&mut self, threshold: usize) -> Option<Vec<Vec<i16>>> {
        if threshold > 0 && self.frames.len() >= threshold {
            Some(std::mem::take(&mut self.frames))
        } else {
            None
        }
    }

    /// Unconditionally drains whatever has accumulated. Used during
    /// shutdown finalization.
    pub fn drain_all(&mut self) -> Vec<Vec<i16>> {
        std::mem::take(&mut self.frames)
    }
}

/// Flattens a batch of frames into one contiguous interleaved sample
/// buffer, preserving arrival order.
pub fn concat_frames(frames: &[Vec<i16>]) -> Vec<i16> {
    let total: usize = frames.iter().map(|f| f.len()).sum();
    let mut samples = Vec::with_capacity(total);
    for frame in frames {
        samples.extend_from_slice(frame);
    }
    samples
}
