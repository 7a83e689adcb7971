use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

/// An uploaded audio file, accepted as a workflow audio source only after
/// it probes as decodable audio.
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub path: PathBuf,
    pub byte_len: u64,
    pub duration_seconds: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
}

impl AudioFile {
    /// Probe a file on disk, rejecting anything that is not audio.
    pub fn probe(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Probing audio file: {}", path.display());

        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let byte_len = file
            .metadata()
            .context("Failed to read file metadata")?
            .len();

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Not a decodable audio file")?;

        let track = probed
            .format
            .default_track()
            .context("File contains no audio track")?;
        let params = &track.codec_params;

        let sample_rate = params.sample_rate;
        let channels = params.channels.map(|c| c.count() as u16);
        let duration_seconds = match (params.n_frames, params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames as f64 / rate as f64),
            _ => None,
        };

        if let Some(duration) = duration_seconds {
            info!(
                "Audio file accepted: {:.1}s, {:?}Hz, {:?} channels",
                duration, sample_rate, channels
            );
        } else {
            info!("Audio file accepted (duration unknown)");
        }

        Ok(Self {
            path: path.to_path_buf(),
            byte_len,
            duration_seconds,
            sample_rate,
            channels,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string())
    }

    /// MIME type guessed from the file extension, for the upload part.
    pub fn mime_type(&self) -> &'static str {
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") | Some("mp4") => "audio/mp4",
            Some("ogg") | Some("oga") => "audio/ogg",
            Some("flac") => "audio/flac",
            _ => "application/octet-stream",
        }
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read file: {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::artifact::RecordingArtifact;
    use crate::audio::capture::{CaptureChunk, CaptureFormat};

    #[test]
    fn test_probe_accepts_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");

        let artifact = RecordingArtifact::from_chunks(
            &[CaptureChunk {
                samples: vec![0i16; 16000],
                timestamp_ms: 0,
            }],
            CaptureFormat::default(),
            1,
        )
        .unwrap();
        std::fs::write(&path, &artifact.bytes).unwrap();

        let file = AudioFile::probe(&path).unwrap();
        assert_eq!(file.sample_rate, Some(16000));
        assert_eq!(file.channels, Some(1));
        assert_eq!(file.mime_type(), "audio/wav");
        assert_eq!(file.file_name(), "sample.wav");
    }

    #[test]
    fn test_probe_rejects_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"this is not audio").unwrap();

        assert!(AudioFile::probe(&path).is_err());
    }

    #[test]
    fn test_probe_rejects_missing_file() {
        assert!(AudioFile::probe("/nonexistent/audio.wav").is_err());
    }
}
