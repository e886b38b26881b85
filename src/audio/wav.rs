//! In-memory WAV container encoding.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;

/// PCM format parameters, fixed for the lifetime of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (16 for this pipeline)
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        }
    }
}

/// Encodes raw interleaved samples into a complete WAV byte buffer: the
/// standard 44-byte PCM header followed by the little-endian payload.
///
/// Pure and deterministic. The header's declared sizes always match the
/// payload that follows; an empty payload still yields a valid container
/// with a zero data size.
pub fn encode(samples: &[i16], format: &AudioFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut buf), format.spec())?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_derived_fields() {
        let format = AudioFormat::default();
        assert_eq!(format.block_align(), 4);
        assert_eq!(format.byte_rate(), 176_400);
    }

    #[test]
    fn encoding_is_deterministic() {
        let format = AudioFormat::default();
        let samples: Vec<i16> = (0..1000).map(|i| (i % 311) as i16).collect();

        let first = encode(&samples, &format).unwrap();
        let second = encode(&samples, &format).unwrap();
        assert_eq!(first, second);
    }
}
