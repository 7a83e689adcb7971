use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{ApiError, BackendClient, ReportMetadata, ReportMethod};
use crate::audio::{AudioFile, RecordingArtifact, ARTIFACT_FILENAME};

use super::session::{
    AudioSource, CorrectionStatus, WorkflowSession, WorkflowStep, DEFAULT_CORRECTION_STYLE,
};

/// Seconds before the correction status indicator returns to Idle.
const STATUS_RESET_SECS: u64 = 3;

pub const MSG_NO_AUDIO: &str =
    "Per favore, carica un file audio o registra un audio prima di procedere.";
pub const MSG_INVALID_AUDIO: &str = "Per favore, carica un file audio valido.";
pub const MSG_EMPTY_TRANSCRIPT: &str =
    "Inserisci una trascrizione prima di generare la relazione.";
pub const MSG_TEXT_TIMEOUT: &str =
    "Il servizio di correzione non ha risposto in tempo. Il testo non è stato modificato.";
pub const MSG_WRONG_STEP: &str = "Operazione non disponibile in questo passaggio.";

/// Notice placed at the top of a locally assembled partial report.
pub const PARTIAL_NOTICE: &str = "Generazione parziale: il servizio di generazione non ha \
    risposto in tempo. Di seguito la trascrizione originale.";

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// An external service call failed.
    #[error("Errore: {0}")]
    Service(#[from] ApiError),

    #[error("{0}")]
    Internal(String),
}

enum TextTool {
    Grammar,
    Filler,
}

/// Drives the four-step pipeline against the backend, holding the whole
/// session state in one aggregate. Every external-call failure is caught
/// here and folded into the session's `error` field.
pub struct WorkflowOrchestrator {
    session: Arc<Mutex<WorkflowSession>>,
    client: BackendClient,
    status_reset: Option<JoinHandle<()>>,
}

impl WorkflowOrchestrator {
    pub fn new(client: BackendClient) -> Self {
        Self {
            session: Arc::new(Mutex::new(WorkflowSession::default())),
            client,
            status_reset: None,
        }
    }

    /// Shared handle to the session state.
    pub fn session(&self) -> Arc<Mutex<WorkflowSession>> {
        Arc::clone(&self.session)
    }

    /// Clone of the current session state.
    pub async fn snapshot(&self) -> WorkflowSession {
        self.session.lock().await.clone()
    }

    /// Probe a file on disk and select it as the audio source, replacing
    /// any recorded artifact.
    pub async fn select_file(&self, path: &Path) -> Result<(), WorkflowError> {
        let owned = path.to_path_buf();
        let probed = tokio::task::spawn_blocking(move || AudioFile::probe(owned))
            .await
            .map_err(|e| WorkflowError::Internal(e.to_string()))?;

        let mut session = self.session.lock().await;
        match probed {
            Ok(file) => {
                info!("Audio source selected: {}", file.file_name());
                session.set_uploaded_file(file);
                session.error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Rejected audio file: {:#}", e);
                session.error = Some(MSG_INVALID_AUDIO.to_string());
                Err(WorkflowError::Validation(MSG_INVALID_AUDIO.to_string()))
            }
        }
    }

    /// Accept a finished recording artifact, replacing any uploaded file.
    pub async fn accept_recording(&self, artifact: RecordingArtifact) {
        let mut session = self.session.lock().await;
        if session.step != WorkflowStep::Input {
            warn!("Recording artifact arrived outside the input step, dropping it");
            return;
        }
        info!(
            "Recording artifact received: {}s, {} bytes",
            artifact.duration_secs,
            artifact.byte_len()
        );
        session.set_recording(artifact);
        session.error = None;
    }

    /// Forward artifacts from a recorder completion channel into the
    /// session for as long as the recorder lives.
    pub fn spawn_recording_intake(
        &self,
        mut completion_rx: mpsc::Receiver<RecordingArtifact>,
    ) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        tokio::spawn(async move {
            while let Some(artifact) = completion_rx.recv().await {
                let mut s = session.lock().await;
                if s.step != WorkflowStep::Input {
                    warn!("Recording artifact arrived outside the input step, dropping it");
                    continue;
                }
                info!(
                    "Recording artifact received: {}s, {} bytes",
                    artifact.duration_secs,
                    artifact.byte_len()
                );
                s.set_recording(artifact);
                s.error = None;
            }
        })
    }

    /// Input → Transcribing → Editing. Rejected without an audio source.
    pub async fn process(&self) -> Result<(), WorkflowError> {
        enum Payload {
            Bytes(Vec<u8>),
            Path(std::path::PathBuf),
        }

        let (filename, mime, payload, clean_filler_words) = {
            let mut session = self.session.lock().await;
            if session.step != WorkflowStep::Input {
                return Err(WorkflowError::Validation(MSG_WRONG_STEP.to_string()));
            }

            let (filename, mime, payload) = match &session.audio_source {
                None => {
                    session.error = Some(MSG_NO_AUDIO.to_string());
                    return Err(WorkflowError::Validation(MSG_NO_AUDIO.to_string()));
                }
                Some(AudioSource::Recording(artifact)) => (
                    ARTIFACT_FILENAME.to_string(),
                    artifact.mime,
                    Payload::Bytes(artifact.bytes.clone()),
                ),
                Some(AudioSource::UploadedFile(file)) => (
                    file.file_name(),
                    file.mime_type(),
                    Payload::Path(file.path.clone()),
                ),
            };

            session.error = None;
            session.step = WorkflowStep::Transcribing;
            (filename, mime, payload, session.clean_filler_words)
        };

        let bytes = match payload {
            Payload::Bytes(recorded) => recorded,
            Payload::Path(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    let message = format!("Impossibile leggere il file audio: {}", e);
                    let mut session = self.session.lock().await;
                    session.error = Some(message.clone());
                    session.step = WorkflowStep::Input;
                    return Err(WorkflowError::Validation(message));
                }
            },
        };

        info!("Transcribing {} ({} bytes)", filename, bytes.len());

        match self
            .client
            .transcribe(&filename, bytes, mime, clean_filler_words)
            .await
        {
            Ok(resp) => {
                info!("Transcription complete (cleaned: {})", resp.cleaned);
                let mut session = self.session.lock().await;
                session.edited_transcript = resp.transcript.clone();
                session.transcript = Some(resp.transcript);
                session.original_transcript = Some(resp.original_transcript);
                // The audio source only survives while on the input step.
                session.audio_source = None;
                session.error = None;
                session.step = WorkflowStep::Editing;
                Ok(())
            }
            Err(e) => {
                let err = WorkflowError::Service(e);
                let mut session = self.session.lock().await;
                session.error = Some(err.to_string());
                // Back to the step the triggering control lives on.
                session.step = WorkflowStep::Input;
                Err(err)
            }
        }
    }

    /// Rewrite the edited transcript for grammar and style.
    pub async fn correct_grammar(&mut self) -> Result<(), WorkflowError> {
        self.apply_text_tool(TextTool::Grammar).await
    }

    /// Remove discourse filler words from the edited transcript.
    pub async fn clean_filler(&mut self) -> Result<(), WorkflowError> {
        self.apply_text_tool(TextTool::Filler).await
    }

    async fn apply_text_tool(&mut self, tool: TextTool) -> Result<(), WorkflowError> {
        let text = {
            let mut session = self.session.lock().await;
            if session.step != WorkflowStep::Editing {
                return Err(WorkflowError::Validation(MSG_WRONG_STEP.to_string()));
            }
            session.error = None;
            session.correction_status = CorrectionStatus::Loading;
            session.edited_transcript.clone()
        };

        let result = match tool {
            TextTool::Grammar => {
                self.client
                    .correct_text(&text, DEFAULT_CORRECTION_STYLE)
                    .await
            }
            TextTool::Filler => self.client.clean_transcript(&text).await,
        };

        let outcome = match result {
            Ok(updated) => {
                let mut session = self.session.lock().await;
                session.edited_transcript = updated;
                session.correction_status = CorrectionStatus::Success;
                session.error = None;
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                // The bounded wait elapsed: leave the text byte-identical so
                // the field is never corrupted, and stay on this step.
                let mut session = self.session.lock().await;
                session.correction_status = CorrectionStatus::Error;
                session.error = Some(MSG_TEXT_TIMEOUT.to_string());
                Err(WorkflowError::Service(e))
            }
            Err(e) => {
                let err = WorkflowError::Service(e);
                let mut session = self.session.lock().await;
                session.correction_status = CorrectionStatus::Error;
                session.error = Some(err.to_string());
                Err(err)
            }
        };

        self.schedule_status_reset();
        outcome
    }

    /// Editing → Report. Rejected while the edited transcript is empty.
    pub async fn generate_report(&self) -> Result<(), WorkflowError> {
        let (transcript, template_id, metadata) = {
            let mut session = self.session.lock().await;
            if session.step != WorkflowStep::Editing {
                return Err(WorkflowError::Validation(MSG_WRONG_STEP.to_string()));
            }
            if session.edited_transcript.trim().is_empty() {
                session.error = Some(MSG_EMPTY_TRANSCRIPT.to_string());
                return Err(WorkflowError::Validation(MSG_EMPTY_TRANSCRIPT.to_string()));
            }
            session.error = None;
            (
                session.edited_transcript.clone(),
                session.selected_template.clone(),
                session.metadata.clone(),
            )
        };

        info!("Generating report (template: {})", template_id);

        match self
            .client
            .generate_report(&transcript, &template_id, &metadata)
            .await
        {
            Ok(resp) => {
                info!("Report generated (method: {:?})", resp.method);
                let mut session = self.session.lock().await;
                session.report = Some(resp.report);
                session.report_method = Some(resp.method);
                session.error = None;
                session.step = WorkflowStep::Report;
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                // Unlike the text tools, an elapsed report bound does not
                // strand the workflow: a partial report embedding the
                // literal transcript is assembled locally and the step
                // still advances.
                warn!("Report generation timed out, assembling partial report");
                let partial = compose_partial_report(&metadata, &transcript);
                let mut session = self.session.lock().await;
                session.report = Some(partial);
                session.report_method = Some(ReportMethod::Local);
                session.error = None;
                session.step = WorkflowStep::Report;
                Ok(())
            }
            Err(e) => {
                let err = WorkflowError::Service(e);
                let mut session = self.session.lock().await;
                session.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Step back one step. Accumulated state survives.
    pub async fn back(&self) {
        let mut session = self.session.lock().await;
        session.step = match session.step {
            WorkflowStep::Editing => WorkflowStep::Input,
            WorkflowStep::Report => WorkflowStep::Editing,
            other => other,
        };
    }

    /// Step forward again onto a step whose data already exists.
    pub async fn forward(&self) {
        let mut session = self.session.lock().await;
        session.step = match session.step {
            WorkflowStep::Input if session.transcript.is_some() => WorkflowStep::Editing,
            WorkflowStep::Editing if session.report.is_some() => WorkflowStep::Report,
            other => other,
        };
    }

    /// Return every field to its default and the step to Input.
    pub async fn reset(&mut self) {
        if let Some(task) = self.status_reset.take() {
            task.abort();
        }
        self.session.lock().await.reset();
        info!("Workflow reset");
    }

    pub async fn set_metadata(&self, metadata: ReportMetadata) {
        self.session.lock().await.metadata = metadata;
    }

    pub async fn set_template(&self, template_id: impl Into<String>) {
        self.session.lock().await.selected_template = template_id.into();
    }

    pub async fn set_edited_transcript(&self, text: impl Into<String>) {
        self.session.lock().await.edited_transcript = text.into();
    }

    pub async fn set_clean_filler_words(&self, clean: bool) {
        self.session.lock().await.clean_filler_words = clean;
    }

    pub async fn clear_error(&self) {
        self.session.lock().await.clear_error();
    }

    fn schedule_status_reset(&mut self) {
        if let Some(task) = self.status_reset.take() {
            task.abort();
        }
        let session = Arc::clone(&self.session);
        self.status_reset = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(STATUS_RESET_SECS)).await;
            session.lock().await.correction_status = CorrectionStatus::Idle;
        }));
    }
}

impl Drop for WorkflowOrchestrator {
    fn drop(&mut self) {
        if let Some(task) = self.status_reset.take() {
            task.abort();
        }
    }
}

/// Assemble the local fallback report used when a bounded report
/// generation elapses: metadata header, notice, then the literal
/// transcript.
fn compose_partial_report(metadata: &ReportMetadata, transcript: &str) -> String {
    let date = chrono::Local::now().format("%d/%m/%Y");
    format!(
        "# {}\n\n**Autore:** {}  \n**Istituzione:** {}  \n**Data:** {}  \n\n---\n\n> {}\n\n## Contenuto Principale\n{}\n",
        metadata.title, metadata.author, metadata.institution, date, PARTIAL_NOTICE, transcript
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_report_embeds_transcript_under_notice() {
        let metadata = ReportMetadata {
            title: "Esperimento 4".to_string(),
            author: "Studente".to_string(),
            institution: "Università".to_string(),
        };
        let report = compose_partial_report(&metadata, "testo della trascrizione");

        assert!(report.contains("# Esperimento 4"));
        assert!(report.contains(PARTIAL_NOTICE));
        assert!(report.contains("testo della trascrizione"));
        let notice_at = report.find(PARTIAL_NOTICE).unwrap();
        let transcript_at = report.find("testo della trascrizione").unwrap();
        assert!(notice_at < transcript_at);
    }
}
