use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::audio::wav;
use crate::audio::{concat_frames, AudioBackend, AudioFormat, FrameAccumulator, SilenceGate};
use crate::error::Result as SottoResult;
use crate::transcribe::{present_words, TranscriptionClient};
use crate::{playback, storage};

/// Lifecycle of a recording session.
///
/// Transitions only move forward: Running → Stopping → Finalizing →
/// Terminated. Once Finalizing is entered, capture frames and scheduler
/// ticks are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Running = 0,
    Stopping = 1,
    Finalizing = 2,
    Terminated = 3,
}

impl Phase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Phase::Running,
            1 => Phase::Stopping,
            2 => Phase::Finalizing,
            _ => Phase::Terminated,
        }
    }
}

/// State shared between the capture task, the flush scheduler, and the
/// shutdown handler. The mutexes guard only short append/drain sections,
/// so they are locked from async context without awaiting.
struct SessionState {
    accumulator: Mutex<FrameAccumulator>,
    last_container: Mutex<Option<Vec<u8>>>,
    phase: AtomicU8,
    frames_seen: AtomicUsize,
    frames_accepted: AtomicUsize,
    flushes: AtomicUsize,
    dispatch_failures: AtomicUsize,
}

impl SessionState {
    fn new() -> Self {
        Self {
            accumulator: Mutex::new(FrameAccumulator::new()),
            last_container: Mutex::new(None),
            phase: AtomicU8::new(Phase::Running as u8),
            frames_seen: AtomicUsize::new(0),
            frames_accepted: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            dispatch_failures: AtomicUsize::new(0),
        }
    }

    fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }

    /// Moves Running → Stopping. Returns false if another caller already
    /// started shutting down, so finalization runs exactly once.
    fn begin_stopping(&self) -> bool {
        self.phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::Stopping as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// A recording session: silence-gated capture, scheduled flushing into WAV
/// containers, and dispatch or persistence of each container.
pub struct RecorderSession {
    config: SessionConfig,
    format: AudioFormat,
    state: Arc<SessionState>,
    client: Option<TranscriptionClient>,
    backend: Box<dyn AudioBackend>,
    capture_task: Option<JoinHandle<()>>,
    flush_task: Option<JoinHandle<()>>,
    started_at: chrono::DateTime<Utc>,
}

impl RecorderSession {
    /// Creates a session around a capture backend. With no transcription
    /// client every flushed container is saved to disk instead.
    pub fn new(
        config: SessionConfig,
        backend: Box<dyn AudioBackend>,
        client: Option<TranscriptionClient>,
    ) -> Self {
        let format = backend.format();

        Self {
            config,
            format,
            state: Arc::new(SessionState::new()),
            client,
            backend,
            capture_task: None,
            flush_task: None,
            started_at: Utc::now(),
        }
    }

    /// Starts capture and the flush scheduler.
    pub async fn start(&mut self) -> Result<()> {
        info!(
            "Starting recording session ({}Hz, {} channels, threshold {}, chunk size {})",
            self.format.sample_rate,
            self.format.channels,
            self.config.silence_threshold,
            self.config.chunk_threshold
        );

        let mut frame_rx = self
            .backend
            .start()
            .await
            .context("Failed to start audio capture")?;

        // Capture task: classify every delivered frame, keep only signal.
        let gate = SilenceGate::new(self.config.silence_threshold);
        let state = Arc::clone(&self.state);
        let capture_task = tokio::spawn(async move {
            info!("Capture task started");

            while let Some(frame) = frame_rx.recv().await {
                if state.phase() != Phase::Running {
                    break;
                }

                state.frames_seen.fetch_add(1, Ordering::Relaxed);

                if gate.is_silent(&frame.samples) {
                    continue;
                }

                state.frames_accepted.fetch_add(1, Ordering::Relaxed);
                state
                    .accumulator
                    .lock()
                    .unwrap()
                    .append(frame.samples);
            }

            info!("Capture task stopped");
        });

        // Flush scheduler: fixed cadence, never blocked by dispatch.
        let state = Arc::clone(&self.state);
        let config = self.config.clone();
        let format = self.format;
        let client = self.client.clone();
        let flush_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.flush_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if state.phase() != Phase::Running {
                    break;
                }

                match flush_once(&state, config.chunk_threshold, &format) {
                    Ok(Some(container)) => {
                        route_container(&state, &config, client.as_ref(), container);
                    }
                    Ok(None) => {}
                    Err(e) => error!("Flush failed: {}", e),
                }
            }

            info!("Flush scheduler stopped");
        });

        self.capture_task = Some(capture_task);
        self.flush_task = Some(flush_task);

        Ok(())
    }

    /// Runs the shutdown state machine and returns final statistics.
    ///
    /// Stopping: the backend stops producing frames and both tasks wind
    /// down. Finalizing: the freshest buffer is encoded and routed to
    /// playback or storage. Terminated: nothing runs afterwards.
    pub async fn shutdown(&mut self) -> Result<SessionStats> {
        if !self.state.begin_stopping() {
            warn!("Shutdown already in progress");
            return Ok(self.stats());
        }

        info!("Stopping recording session");

        if let Err(e) = self.backend.stop().await {
            error!("Failed to stop capture backend: {}", e);
        }

        // The capture task ends once the backend closes the frame channel.
        if let Some(task) = self.capture_task.take() {
            if let Err(e) = task.await {
                error!("Capture task panicked: {}", e);
            }
        }

        // The scheduler only yields between ticks, so aborting here cannot
        // interrupt an in-progress flush.
        if let Some(task) = self.flush_task.take() {
            task.abort();
            let _ = task.await;
        }

        self.state.set_phase(Phase::Finalizing);

        let container = self.finalize_container();
        match container {
            Ok(container) => {
                if self.config.play_on_exit {
                    if let Err(e) = playback::play_container(&container).await {
                        error!("Playback failed: {}", e);
                    }
                } else if let Err(e) =
                    storage::save_container(&self.config.output_dir, &container)
                {
                    error!("Failed to save final container: {}", e);
                }
            }
            Err(e) => error!("Failed to encode final container: {}", e),
        }

        self.state.set_phase(Phase::Terminated);

        let stats = self.stats();
        info!(
            "Session terminated: {} frames seen, {} accepted, {} flushes, {} dispatch failures",
            stats.frames_seen, stats.frames_accepted, stats.flushes, stats.dispatch_failures
        );

        Ok(stats)
    }

    /// Chooses the buffer to finalize, preferring the most recently
    /// captured audio: unflushed frames win when present; the last flushed
    /// container is reused only when nothing has accumulated since. With
    /// neither, an empty container is produced so shutdown always yields a
    /// valid artifact.
    fn finalize_container(&self) -> SottoResult<Vec<u8>> {
        let frames = self.state.accumulator.lock().unwrap().drain_all();

        if !frames.is_empty() {
            info!("Finalizing {} unflushed frames", frames.len());
            let samples = concat_frames(&frames);
            return wav::encode(&samples, &self.format);
        }

        if let Some(container) = self.state.last_container.lock().unwrap().take() {
            info!("Finalizing last flushed container ({} bytes)", container.len());
            return Ok(container);
        }

        info!("Nothing captured, finalizing an empty container");
        wav::encode(&[], &self.format)
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Snapshot of current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            started_at: self.started_at,
            frames_seen: self.state.frames_seen.load(Ordering::Relaxed),
            frames_accepted: self.state.frames_accepted.load(Ordering::Relaxed),
            pending_frames: self.state.accumulator.lock().unwrap().len(),
            flushes: self.state.flushes.load(Ordering::Relaxed),
            dispatch_failures: self.state.dispatch_failures.load(Ordering::Relaxed),
        }
    }
}

/// One scheduler tick: drain a due batch, encode it, remember it as the
/// most recent container. Returns the container if a flush happened.
fn flush_once(
    state: &SessionState,
    threshold: usize,
    format: &AudioFormat,
) -> SottoResult<Option<Vec<u8>>> {
    let batch = state.accumulator.lock().unwrap().try_flush(threshold);
    let Some(frames) = batch else {
        return Ok(None);
    };

    let samples = concat_frames(&frames);
    let container = wav::encode(&samples, format)?;

    *state.last_container.lock().unwrap() = Some(container.clone());
    state.flushes.fetch_add(1, Ordering::Relaxed);

    info!(
        "Flushed {} frames into a {} byte container",
        frames.len(),
        container.len()
    );

    Ok(Some(container))
}

/// Hands a flushed container to exactly one sink: storage when configured
/// (or when no client is available), otherwise a spawned dispatch task so
/// a slow network call never delays the next tick.
fn route_container(
    state: &Arc<SessionState>,
    config: &SessionConfig,
    client: Option<&TranscriptionClient>,
    container: Vec<u8>,
) {
    let client = match client {
        Some(client) if !config.save_partial => client.clone(),
        _ => {
            if let Err(e) = storage::save_container(&config.output_dir, &container) {
                error!("Failed to save container: {}", e);
            }
            return;
        }
    };

    let state = Arc::clone(state);
    let word_delay = config.word_delay;
    tokio::spawn(async move {
        let filename = format!("{}.wav", Uuid::new_v4());

        match client.transcribe(container, filename).await {
            Ok(text) => present_words(&text, word_delay).await,
            Err(e) => {
                state.dispatch_failures.fetch_add(1, Ordering::Relaxed);
                error!("Dispatch failed, discarding batch: {}", e);
            }
        }
    });
}
