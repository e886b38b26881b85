//! Silence gating for captured audio frames.
//!
//! Every frame delivered by the capture backend is classified as signal or
//! silence with an RMS loudness estimate against a fixed threshold. Single
//! pass, no lookback window, no adaptive state.

/// Root-mean-square amplitude of a frame of 16-bit samples.
///
/// The sum of squares is accumulated in i64 so frames of tens of thousands
/// of full-scale samples stay far from overflow. An empty frame has zero
/// loudness.
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| s as i64 * s as i64).sum();
    (sum as f64 / samples.len() as f64).sqrt()
}

/// Threshold classifier over [`rms`].
#[derive(Debug, Clone, Copy)]
pub struct SilenceGate {
    threshold: f64,
}

impl SilenceGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Returns true when the frame's loudness is below the threshold.
    /// Empty frames are always silent.
    pub fn is_silent(&self, samples: &[i16]) -> bool {
        rms(samples) < self.threshold
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_frame_is_silent() {
        let gate = SilenceGate::new(0.0);
        assert!(gate.is_silent(&[]));
    }

    #[test]
    fn constant_amplitude_rms_is_exact() {
        let frame = vec![100i16; 4410];
        assert_eq!(rms(&frame), 100.0);

        let frame: Vec<i16> = (0..4410).map(|i| if i % 2 == 0 { 7 } else { -7 }).collect();
        assert_eq!(rms(&frame), 7.0);
    }

    #[test]
    fn full_scale_frame_does_not_overflow() {
        let frame = vec![i16::MIN; 65536];
        let expected = (i16::MIN as f64).abs();
        assert!((rms(&frame) - expected).abs() < 1.0);
    }
}
