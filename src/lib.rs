pub mod api;
pub mod audio;
pub mod config;
pub mod export;
pub mod recorder;
pub mod status;
pub mod workflow;

pub use api::{ApiError, BackendClient, ReportMetadata, ReportMethod, Template, TemplateCatalog};
pub use audio::{
    AudioFile, CaptureChunk, CaptureDevice, CaptureError, CaptureFormat, MicrophoneDevice,
    RecordingArtifact, ARTIFACT_FILENAME, ARTIFACT_MIME,
};
pub use config::Config;
pub use export::{DocumentLayout, ExportError};
pub use recorder::{RecorderController, RecorderError, RecorderState};
pub use status::{Availability, StatusSnapshot, SystemStatusPoller};
pub use workflow::{
    AudioSource, CorrectionStatus, WorkflowError, WorkflowOrchestrator, WorkflowSession,
    WorkflowStep,
};
