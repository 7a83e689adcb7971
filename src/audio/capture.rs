use thiserror::Error;
use tokio::sync::mpsc;

/// A PCM fragment emitted by a capture device (16-bit, interleaved).
#[derive(Debug, Clone)]
pub struct CaptureChunk {
    pub samples: Vec<i16>,
    /// Milliseconds since capture started.
    pub timestamp_ms: u64,
}

impl CaptureChunk {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// PCM format a capture device delivers chunks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz for Whisper
            channels: 1,        // Mono
        }
    }
}

/// Failure to obtain or operate the capture device. Terminal for the
/// attempt, not for the controller: a later start may retry.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device unavailable: {0}")]
    Unavailable(String),

    #[error("Capture device access denied: {0}")]
    Denied(String),

    #[error("Capture device failed: {0}")]
    Failed(String),
}

/// Microphone capture backend trait
///
/// Implementations:
/// - `MicrophoneDevice`: cpal default input device
/// - channel-scripted doubles in tests
#[async_trait::async_trait]
pub trait CaptureDevice: Send {
    /// Acquire the device and start emitting chunks.
    ///
    /// Returns a channel receiver that will receive capture chunks.
    /// Acquisition may be denied by the user/OS at any time.
    async fn acquire(&mut self) -> Result<mpsc::Receiver<CaptureChunk>, CaptureError>;

    /// Request the device to stop. The stop is confirmed by the chunk
    /// channel closing once the last buffered chunk has been delivered.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Release the underlying tracks. Must be safe to call in any state
    /// and must free the hardware at most once.
    fn release(&mut self);

    /// The PCM format emitted chunks are in.
    fn format(&self) -> CaptureFormat;

    /// Get device name for logging
    fn name(&self) -> &str;
}
