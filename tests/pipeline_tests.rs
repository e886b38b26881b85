// End-to-end tests for the silence-gated chunking pipeline and the
// shutdown state machine.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use sotto::audio::{wav, AudioBackend, AudioFormat, AudioFrame, FrameAccumulator, SilenceGate};
use sotto::session::{Phase, RecorderSession, SessionConfig};
use tempfile::TempDir;
use tokio::sync::mpsc;

const FRAME_LEN: usize = 64;

fn signal_frame() -> Vec<i16> {
    vec![10i16; FRAME_LEN]
}

fn silent_frame() -> Vec<i16> {
    vec![0i16; FRAME_LEN]
}

/// Capture backend that replays a fixed set of frames and then closes the
/// channel, as a real backend does when it stops.
struct ReplayBackend {
    frames: Vec<Vec<i16>>,
    format: AudioFormat,
}

impl ReplayBackend {
    fn new(frames: Vec<Vec<i16>>) -> Self {
        Self {
            frames,
            format: AudioFormat {
                channels: 2,
                sample_rate: 44100,
                bits_per_sample: 16,
            },
        }
    }
}

#[async_trait]
impl AudioBackend for ReplayBackend {
    async fn start(&mut self) -> sotto::Result<mpsc::Receiver<AudioFrame>> {
        let frames = std::mem::take(&mut self.frames);
        let (tx, rx) = mpsc::channel(frames.len().max(1));

        // Queue everything up front; dropping the sender closes the
        // channel once the session has consumed the frames.
        for samples in frames {
            let _ = tx.send(AudioFrame { samples }).await;
        }

        Ok(rx)
    }

    async fn stop(&mut self) -> sotto::Result<()> {
        Ok(())
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn name(&self) -> &str {
        "replay"
    }
}

fn test_config(dir: &TempDir) -> SessionConfig {
    SessionConfig {
        silence_threshold: 2.0,
        flush_interval: Duration::from_millis(50),
        chunk_threshold: 90,
        save_partial: true,
        play_on_exit: false,
        output_dir: dir.path().to_path_buf(),
        word_delay: Duration::from_millis(0),
    }
}

fn wav_files(dir: &TempDir) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "wav").unwrap_or(false))
        .collect();
    files.sort();
    files
}

fn sample_count(path: &std::path::Path) -> usize {
    let bytes = std::fs::read(path).unwrap();
    hound::WavReader::new(Cursor::new(&bytes)).unwrap().len() as usize
}

// Drives the classifier, accumulator, and encoder by hand so the scenario
// is independent of wall-clock scheduling: 200 frames, frames 50-55 silent,
// chunk threshold 90.
#[test]
fn silent_frames_are_skipped_and_the_first_flush_takes_ninety_frames() {
    let gate = SilenceGate::new(2.0);
    let mut acc = FrameAccumulator::new();
    let format = AudioFormat::default();
    let mut first_flush: Option<Vec<u8>> = None;

    for i in 0..200usize {
        let samples = if (50..56).contains(&i) {
            silent_frame()
        } else {
            signal_frame()
        };

        if !gate.is_silent(&samples) {
            acc.append(samples);
        }

        // The 90th signal frame arrives with stream frame 95 (six silent
        // frames skipped); a scheduler tick here drains the batch.
        if first_flush.is_none() {
            if let Some(frames) = acc.try_flush(90) {
                assert_eq!(i, 95);
                assert_eq!(frames.len(), 90);

                let samples: Vec<i16> = frames.concat();
                first_flush = Some(wav::encode(&samples, &format).unwrap());
            }
        }
    }

    let container = first_flush.expect("threshold was reached");
    let payload_bytes = 90 * FRAME_LEN * 2;
    assert_eq!(container.len(), 44 + payload_bytes);

    // 200 frames, 6 silent, 90 flushed: the rest stay accumulated.
    assert_eq!(acc.len(), 104);
}

#[tokio::test]
async fn scheduler_flushes_once_threshold_is_reached() {
    let dir = TempDir::new().unwrap();
    // Exactly threshold-many frames: a tick either flushes the full batch
    // or nothing, independent of scheduling.
    let backend = ReplayBackend::new(vec![signal_frame(); 90]);

    let mut session = RecorderSession::new(test_config(&dir), Box::new(backend), None);
    session.start().await.unwrap();
    assert_eq!(session.phase(), Phase::Running);

    // All frames are replayed immediately; give the scheduler a few ticks.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stats = session.shutdown().await.unwrap();
    assert_eq!(session.phase(), Phase::Terminated);
    assert_eq!(stats.frames_seen, 90);
    assert_eq!(stats.frames_accepted, 90);
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.pending_frames, 0);

    // One flushed container plus the finalized one (the accumulator was
    // empty at shutdown, so the last flushed container is reused).
    let files = wav_files(&dir);
    assert_eq!(files.len(), 2);
    for file in &files {
        assert_eq!(sample_count(file), 90 * FRAME_LEN);
    }
}

#[tokio::test]
async fn silent_capture_accumulates_nothing() {
    let dir = TempDir::new().unwrap();
    let backend = ReplayBackend::new(vec![silent_frame(); 50]);

    let mut session = RecorderSession::new(test_config(&dir), Box::new(backend), None);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stats = session.shutdown().await.unwrap();
    assert_eq!(stats.frames_seen, 50);
    assert_eq!(stats.frames_accepted, 0);
    assert_eq!(stats.flushes, 0);
}

#[tokio::test]
async fn shutdown_with_nothing_captured_produces_a_valid_empty_container() {
    let dir = TempDir::new().unwrap();
    let backend = ReplayBackend::new(Vec::new());

    let mut session = RecorderSession::new(test_config(&dir), Box::new(backend), None);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = session.shutdown().await.unwrap();
    assert_eq!(stats.frames_seen, 0);
    assert_eq!(stats.flushes, 0);

    let files = wav_files(&dir);
    assert_eq!(files.len(), 1);
    assert_eq!(sample_count(&files[0]), 0);
    assert_eq!(std::fs::metadata(&files[0]).unwrap().len(), 44);
}

#[tokio::test]
async fn shutdown_prefers_unflushed_frames_over_the_last_container() {
    let dir = TempDir::new().unwrap();
    let backend = ReplayBackend::new(vec![signal_frame(); 10]);

    let mut config = test_config(&dir);
    config.chunk_threshold = 1000; // never reached, nothing flushes
    let mut session = RecorderSession::new(config, Box::new(backend), None);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stats = session.shutdown().await.unwrap();
    assert_eq!(stats.flushes, 0);
    assert_eq!(stats.frames_accepted, 10);

    // The freshly accumulated frames become the final container.
    let files = wav_files(&dir);
    assert_eq!(files.len(), 1);
    assert_eq!(sample_count(&files[0]), 10 * FRAME_LEN);
}

#[tokio::test]
async fn shutdown_twice_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let backend = ReplayBackend::new(vec![signal_frame(); 5]);

    let mut session = RecorderSession::new(test_config(&dir), Box::new(backend), None);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    session.shutdown().await.unwrap();
    let files_after_first = wav_files(&dir).len();

    session.shutdown().await.unwrap();
    assert_eq!(wav_files(&dir).len(), files_after_first);
}
