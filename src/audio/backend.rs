//! Audio capture backends.
//!
//! The session only depends on the [`AudioBackend`] trait: start a stream of
//! frames, stop it, report the format being captured. The cpal
//! implementation converts whatever the device delivers to interleaved
//! 16-bit PCM.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::audio::wav::AudioFormat;
use crate::error::{Result, SottoError};

/// One capture callback's worth of interleaved 16-bit PCM.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
}

/// Configuration for audio capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Input device name substring; `None` selects the system default.
    pub device: Option<String>,
    /// Capacity of the frame channel between the capture thread and the
    /// session. Frames are dropped (with a warning) if the session ever
    /// falls this far behind.
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            channel_capacity: 256,
        }
    }
}

/// Audio capture backend trait
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio and release the device
    async fn stop(&mut self) -> Result<()>;

    /// Format of the frames this backend produces
    fn format(&self) -> AudioFormat;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Microphone capture through cpal.
pub struct CpalBackend {
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    sample_format: SampleFormat,
    format: AudioFormat,
    channel_capacity: usize,
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalBackend {
    /// Opens the requested input device and resolves the capture format.
    /// Fails here, before any recording starts, if the device is missing.
    pub fn new(config: &CaptureConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = match &config.device {
            Some(name) => host
                .input_devices()
                .map_err(|e| SottoError::Capture {
                    message: format!("failed to enumerate input devices: {}", e),
                })?
                .find(|d| d.name().map(|n| n.contains(name)).unwrap_or(false))
                .ok_or_else(|| SottoError::DeviceNotFound {
                    device: name.clone(),
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| SottoError::DeviceNotFound {
                    device: "default".to_string(),
                })?,
        };

        let default_config = device
            .default_input_config()
            .map_err(|e| SottoError::Capture {
                message: format!("failed to query device config: {}", e),
            })?;

        let format = AudioFormat {
            channels: default_config.channels(),
            sample_rate: default_config.sample_rate().0,
            bits_per_sample: 16,
        };

        info!(
            "Capture device: {} ({}Hz, {} channels, {:?})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            format.sample_rate,
            format.channels,
            default_config.sample_format()
        );

        Ok(Self {
            device,
            stream_config: default_config.config(),
            sample_format: default_config.sample_format(),
            format,
            channel_capacity: config.channel_capacity,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }
}

#[async_trait]
impl AudioBackend for CpalBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        let (frame_tx, frame_rx) = mpsc::channel(self.channel_capacity);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let device = self.device.clone();
        let stream_config = self.stream_config.clone();
        let sample_format = self.sample_format;
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        // cpal streams are not Send, so the stream lives on a dedicated
        // thread and is dropped there when capture stops.
        let thread_running = Arc::clone(&self.running);
        let handle = std::thread::spawn(move || {
            let stream = match build_stream(
                &device,
                &stream_config,
                sample_format,
                frame_tx,
                Arc::clone(&thread_running),
            ) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(SottoError::Capture {
                    message: format!("failed to start stream: {}", e),
                }));
                return;
            }

            let _ = ready_tx.send(Ok(()));

            while thread_running.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(50));
            }
            drop(stream);
        });
        self.thread = Some(handle);

        match tokio::task::spawn_blocking(move || ready_rx.recv()).await {
            Ok(Ok(result)) => result?,
            _ => {
                running.store(false, Ordering::SeqCst);
                return Err(SottoError::Capture {
                    message: "capture thread exited during startup".to_string(),
                });
            }
        }

        info!("Audio capture started");
        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        // The capture thread polls the flag every 50ms, so this join is
        // short enough to do inline.
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("Capture thread panicked during shutdown");
            }
        }

        info!("Audio capture stopped");
        Ok(())
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        "cpal"
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: SampleFormat,
    frame_tx: mpsc::Sender<AudioFrame>,
    running: Arc<AtomicBool>,
) -> Result<cpal::Stream> {
    match sample_format {
        SampleFormat::I16 => build_stream_typed::<i16>(device, config, frame_tx, running),
        SampleFormat::U16 => build_stream_typed::<u16>(device, config, frame_tx, running),
        SampleFormat::F32 => build_stream_typed::<f32>(device, config, frame_tx, running),
        other => Err(SottoError::Capture {
            message: format!("unsupported sample format: {:?}", other),
        }),
    }
}

fn build_stream_typed<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frame_tx: mpsc::Sender<AudioFrame>,
    running: Arc<AtomicBool>,
) -> Result<cpal::Stream>
where
    T: SizedSample + Send + 'static,
    i16: FromSample<T>,
{
    let err_fn = |err| error!("Audio stream error: {}", err);

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                if !running.load(Ordering::SeqCst) {
                    return;
                }

                let samples: Vec<i16> = data.iter().map(|&s| i16::from_sample(s)).collect();

                // Never block the audio callback. If the session falls
                // behind, the frame is dropped and reported.
                match frame_tx.try_send(AudioFrame { samples }) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Frame channel full, dropping capture frame");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                }
            },
            err_fn,
            None,
        )
        .map_err(|e| SottoError::Capture {
            message: format!("failed to build input stream: {}", e),
        })?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_conversion_covers_capture_formats() {
        assert_eq!(i16::from_sample(0.0f32), 0);
        assert_eq!(i16::from_sample(0x8000u16), 0);
        assert_eq!(i16::from_sample(1234i16), 1234);
    }
}
