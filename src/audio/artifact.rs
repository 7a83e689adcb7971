use anyhow::{Context, Result};
use std::io::Cursor;

use super::capture::{CaptureChunk, CaptureFormat};

/// Fixed MIME type for recorded artifacts.
pub const ARTIFACT_MIME: &str = "audio/wav";

/// Fixed upload filename for recorded artifacts.
pub const ARTIFACT_FILENAME: &str = "recorded_audio.wav";

/// The finished audio blob produced by one recording session: the
/// concatenation of all non-empty chunks in arrival order, packed into a
/// WAV container.
#[derive(Debug, Clone)]
pub struct RecordingArtifact {
    /// Complete WAV container bytes.
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub duration_secs: u64,
    pub sample_count: usize,
}

impl RecordingArtifact {
    /// Assemble the artifact from recorded chunks.
    pub fn from_chunks(
        chunks: &[CaptureChunk],
        format: CaptureFormat,
        duration_secs: u64,
    ) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut sample_count = 0;
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;

            for chunk in chunks {
                for &sample in &chunk.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
                sample_count += chunk.samples.len();
            }

            writer.finalize().context("Failed to finalize WAV data")?;
        }

        Ok(Self {
            bytes: cursor.into_inner(),
            mime: ARTIFACT_MIME,
            duration_secs,
            sample_count,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
