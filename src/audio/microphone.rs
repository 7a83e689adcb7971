//! Microphone capture device backed by cpal.
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread owned
//! by the device. The thread forwards PCM chunks into an mpsc channel and
//! exits when the stop flag is raised, which drops the stream and closes
//! the channel (the stop confirmation).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use super::capture::{CaptureChunk, CaptureDevice, CaptureError, CaptureFormat};

const CHUNK_CHANNEL_CAPACITY: usize = 256;

pub struct MicrophoneDevice {
    format: CaptureFormat,
    worker: Option<CaptureWorker>,
}

struct CaptureWorker {
    stop_flag: Arc<AtomicBool>,
    handle: std::thread::JoinHandle<()>,
}

impl MicrophoneDevice {
    pub fn new(format: CaptureFormat) -> Self {
        Self {
            format,
            worker: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn acquire(&mut self) -> Result<mpsc::Receiver<CaptureChunk>, CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::Failed("already capturing".to_string()));
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let stop_flag = Arc::new(AtomicBool::new(false));

        let target = self.format;
        let thread_stop = Arc::clone(&stop_flag);
        let handle = std::thread::spawn(move || {
            run_capture_thread(target, thread_stop, chunk_tx, ready_tx);
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.worker = Some(CaptureWorker { stop_flag, handle });
                Ok(chunk_rx)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::Failed(
                "capture thread exited during startup".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        worker.stop_flag.store(true, Ordering::SeqCst);

        tokio::task::spawn_blocking(move || {
            if worker.handle.join().is_err() {
                error!("Capture thread panicked");
            }
        })
        .await
        .map_err(|e| CaptureError::Failed(e.to_string()))?;

        Ok(())
    }

    fn release(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop_flag.store(true, Ordering::SeqCst);
            info!("Capture device released");
        }
    }

    fn format(&self) -> CaptureFormat {
        self.format
    }

    fn name(&self) -> &str {
        "cpal default input"
    }
}

impl Drop for MicrophoneDevice {
    fn drop(&mut self) {
        self.release();
    }
}

fn run_capture_thread(
    target: CaptureFormat,
    stop_flag: Arc<AtomicBool>,
    chunk_tx: mpsc::Sender<CaptureChunk>,
    ready_tx: oneshot::Sender<Result<(), CaptureError>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready_tx.send(Err(CaptureError::Unavailable(
            "no default input device".to_string(),
        )));
        return;
    };

    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Denied(e.to_string())));
            return;
        }
    };

    let source_rate = supported.sample_rate().0;
    let source_channels = supported.channels();
    let sample_format = supported.sample_format();
    let stream_config = supported.config();

    info!(
        "Capturing from '{}': {}Hz, {} channels, {:?}",
        device_name, source_rate, source_channels, sample_format
    );

    let mut forwarder = Forwarder {
        target,
        source_rate,
        source_channels,
        tx: chunk_tx,
        samples_sent: 0,
    };

    let err_fn = |e| error!("Capture stream error: {}", e);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| forwarder.push_f32(data),
            err_fn,
            None,
        ),
        cpal::SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| forwarder.push_i16(data),
            err_fn,
            None,
        ),
        other => {
            let _ = ready_tx.send(Err(CaptureError::Failed(format!(
                "unsupported sample format: {:?}",
                other
            ))));
            return;
        }
    };

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(CaptureError::Failed(e.to_string())));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(CaptureError::Failed(e.to_string())));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !stop_flag.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(50));
    }

    // Dropping the stream stops the hardware and drops the chunk sender,
    // which closes the channel and confirms the stop downstream.
    drop(stream);
    info!("Capture thread stopped");
}

/// Converts incoming buffers to the target PCM format and forwards them.
struct Forwarder {
    target: CaptureFormat,
    source_rate: u32,
    source_channels: u16,
    tx: mpsc::Sender<CaptureChunk>,
    samples_sent: u64,
}

impl Forwarder {
    fn push_f32(&mut self, data: &[f32]) {
        let pcm: Vec<i16> = data
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();
        self.push_pcm(pcm);
    }

    fn push_i16(&mut self, data: &[i16]) {
        self.push_pcm(data.to_vec());
    }

    fn push_pcm(&mut self, samples: Vec<i16>) {
        let samples = downmix_to_mono(samples, self.source_channels, self.target.channels);
        let samples = decimate(samples, self.source_rate, self.target.sample_rate);

        let timestamp_ms = self.samples_sent * 1000 / self.target.sample_rate.max(1) as u64;
        self.samples_sent += samples.len() as u64;

        let chunk = CaptureChunk {
            samples,
            timestamp_ms,
        };

        // The audio callback must not block; drop the chunk on backpressure.
        if self.tx.try_send(chunk).is_err() {
            warn!("Capture chunk dropped (channel full or closed)");
        }
    }
}

/// Convert stereo to mono by summing channels with clipping.
fn downmix_to_mono(samples: Vec<i16>, source_channels: u16, target_channels: u16) -> Vec<i16> {
    if source_channels == target_channels || target_channels != 1 || source_channels != 2 {
        return samples;
    }

    let mut mono = Vec::with_capacity(samples.len() / 2);
    for pair in samples.chunks_exact(2) {
        let sum = pair[0] as i32 + pair[1] as i32;
        mono.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
    }
    mono
}

/// Downsample by decimation: take every Nth sample.
fn decimate(samples: Vec<i16>, source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate || target_rate == 0 {
        return samples;
    }

    let ratio = source_rate / target_rate;
    if ratio <= 1 {
        return samples; // Can't upsample
    }

    samples
        .iter()
        .step_by(ratio as usize)
        .copied()
        .collect()
}
