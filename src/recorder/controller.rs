use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::audio::{CaptureChunk, CaptureDevice, CaptureError, CaptureFormat, RecordingArtifact};

/// Explicit recorder lifecycle. Illegal transitions (stop while Idle,
/// start while Recording) are rejected as no-ops instead of being
/// tolerated by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Requesting,
    Recording,
    Stopping,
}

#[derive(Debug, Error)]
pub enum RecorderError {
    /// Capture device unavailable or denied. Terminal for this attempt
    /// only; a later start may retry.
    #[error("Impossibile accedere al microfono: {0}")]
    Capability(#[from] CaptureError),

    #[error("Recording failed: {0}")]
    Internal(String),
}

/// Owns the capture device handle, accumulates chunks, tracks elapsed
/// time, and emits one finished artifact per recording over the
/// completion channel.
pub struct RecorderController {
    device: Box<dyn CaptureDevice>,
    state: RecorderState,
    elapsed: Arc<AtomicU64>,
    recording: Arc<AtomicBool>,
    chunks: Arc<Mutex<Vec<CaptureChunk>>>,
    collector: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
    completion_tx: mpsc::Sender<RecordingArtifact>,
}

impl RecorderController {
    /// Create a controller around a capture device. Finished artifacts are
    /// delivered exactly once each on `completion_tx`.
    pub fn new(
        device: impl CaptureDevice + 'static,
        completion_tx: mpsc::Sender<RecordingArtifact>,
    ) -> Self {
        Self {
            device: Box::new(device),
            state: RecorderState::Idle,
            elapsed: Arc::new(AtomicU64::new(0)),
            recording: Arc::new(AtomicBool::new(false)),
            chunks: Arc::new(Mutex::new(Vec::new())),
            collector: None,
            ticker: None,
            completion_tx,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Seconds spent in the current (or last) recording.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    pub fn format(&self) -> CaptureFormat {
        self.device.format()
    }

    /// Start recording. A no-op unless Idle.
    pub async fn start(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Idle {
            warn!("Recording already started, ignoring start request");
            return Ok(());
        }

        self.state = RecorderState::Requesting;
        info!("Acquiring capture device: {}", self.device.name());

        let mut chunk_rx = match self.device.acquire().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state = RecorderState::Idle;
                return Err(RecorderError::Capability(e));
            }
        };

        self.chunks.lock().await.clear();
        self.elapsed.store(0, Ordering::SeqCst);
        self.recording.store(true, Ordering::SeqCst);
        self.state = RecorderState::Recording;

        // Collect non-empty chunks in arrival order until the device
        // confirms the stop by closing the channel.
        let chunks = Arc::clone(&self.chunks);
        self.collector = Some(tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                if chunk.is_empty() {
                    continue;
                }
                chunks.lock().await.push(chunk);
            }
        }));

        // One-second tick while recording.
        let elapsed = Arc::clone(&self.elapsed);
        let recording = Arc::clone(&self.recording);
        self.ticker = Some(tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.tick().await; // first tick completes immediately
            loop {
                tick.tick().await;
                if !recording.load(Ordering::SeqCst) {
                    break;
                }
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));

        info!("Recording started");
        Ok(())
    }

    /// Stop recording and emit the artifact. A no-op unless Recording.
    pub async fn stop(&mut self) -> Result<(), RecorderError> {
        if self.state != RecorderState::Recording {
            warn!("Recording not active, ignoring stop request");
            return Ok(());
        }

        self.state = RecorderState::Stopping;

        // The tick is cancelled before the stop completes; tick and stop
        // never run concurrently.
        self.recording.store(false, Ordering::SeqCst);
        if let Some(task) = self.ticker.take() {
            task.abort();
        }

        let stop_result = self.device.stop().await;
        if let Err(e) = stop_result {
            self.finish_attempt();
            return Err(RecorderError::Capability(e));
        }

        // Wait for the collector to drain the closed channel so the
        // artifact sees every chunk in emission order.
        if let Some(task) = self.collector.take() {
            if task.await.is_err() {
                self.finish_attempt();
                return Err(RecorderError::Internal("chunk collector failed".to_string()));
            }
        }

        let chunks = {
            let mut guard = self.chunks.lock().await;
            std::mem::take(&mut *guard)
        };

        let artifact = RecordingArtifact::from_chunks(
            &chunks,
            self.device.format(),
            self.elapsed.load(Ordering::SeqCst),
        );

        self.finish_attempt();

        let artifact = artifact.map_err(|e| RecorderError::Internal(e.to_string()))?;

        info!(
            "Recording stopped: {}s, {} samples, {} bytes",
            artifact.duration_secs,
            artifact.sample_count,
            artifact.byte_len()
        );

        if self.completion_tx.send(artifact).await.is_err() {
            warn!("Recording completed but nobody is listening for the artifact");
        }

        Ok(())
    }

    /// Release the device and return to Idle. Runs on every stop path.
    fn finish_attempt(&mut self) {
        self.device.release();
        self.state = RecorderState::Idle;
    }
}

impl Drop for RecorderController {
    fn drop(&mut self) {
        // The device must be released even if stop() was never called.
        self.recording.store(false, Ordering::SeqCst);
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
        if let Some(task) = self.collector.take() {
            task.abort();
        }
        self.device.release();
    }
}
