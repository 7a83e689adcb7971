pub mod artifact;
pub mod capture;
pub mod file;
pub mod microphone;

pub use artifact::{RecordingArtifact, ARTIFACT_FILENAME, ARTIFACT_MIME};
pub use capture::{CaptureChunk, CaptureDevice, CaptureError, CaptureFormat};
pub use file::AudioFile;
pub use microphone::MicrophoneDevice;
