use crate::api::{ReportMetadata, ReportMethod};
use crate::audio::{AudioFile, RecordingArtifact};

pub const DEFAULT_TITLE: &str = "Relazione di Laboratorio";
pub const DEFAULT_AUTHOR: &str = "Studente";
pub const DEFAULT_INSTITUTION: &str = "Università";
pub const DEFAULT_TEMPLATE_ID: &str = "lab_report";
pub const DEFAULT_CORRECTION_STYLE: &str = "academic";

/// The four wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowStep {
    Input = 1,
    Transcribing = 2,
    Editing = 3,
    Report = 4,
}

impl WorkflowStep {
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// The session's audio input: an uploaded file or a produced recording.
/// Holding them in one slot makes the two mutually exclusive by
/// construction; selecting one replaces the other.
#[derive(Debug, Clone)]
pub enum AudioSource {
    UploadedFile(AudioFile),
    Recording(RecordingArtifact),
}

/// Outcome indicator for the grammar-correction/filler-cleanup tools.
/// Self-resets to Idle after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// The whole workflow state as one aggregate, mutated only through the
/// orchestrator so step invariants stay checkable in one place.
#[derive(Debug, Clone)]
pub struct WorkflowSession {
    pub step: WorkflowStep,
    pub audio_source: Option<AudioSource>,
    /// Ask the backend to remove filler words during transcription.
    pub clean_filler_words: bool,
    /// Service-returned (possibly cleaned) text.
    pub transcript: Option<String>,
    /// Pre-cleaning text as transcribed.
    pub original_transcript: Option<String>,
    /// User-mutable text, initialised from `transcript`.
    pub edited_transcript: String,
    pub metadata: ReportMetadata,
    pub selected_template: String,
    pub report: Option<String>,
    pub report_method: Option<ReportMethod>,
    pub correction_status: CorrectionStatus,
    pub error: Option<String>,
}

impl Default for WorkflowSession {
    fn default() -> Self {
        Self {
            step: WorkflowStep::Input,
            audio_source: None,
            clean_filler_words: true,
            transcript: None,
            original_transcript: None,
            edited_transcript: String::new(),
            metadata: ReportMetadata {
                title: DEFAULT_TITLE.to_string(),
                author: DEFAULT_AUTHOR.to_string(),
                institution: DEFAULT_INSTITUTION.to_string(),
            },
            selected_template: DEFAULT_TEMPLATE_ID.to_string(),
            report: None,
            report_method: None,
            correction_status: CorrectionStatus::Idle,
            error: None,
        }
    }
}

impl WorkflowSession {
    /// Return every field to its default, including any selected file.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_uploaded_file(&mut self, file: AudioFile) {
        self.audio_source = Some(AudioSource::UploadedFile(file));
    }

    pub fn set_recording(&mut self, artifact: RecordingArtifact) {
        self.audio_source = Some(AudioSource::Recording(artifact));
    }

    pub fn clear_audio(&mut self) {
        self.audio_source = None;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn has_audio_source(&self) -> bool {
        self.audio_source.is_some()
    }
}
