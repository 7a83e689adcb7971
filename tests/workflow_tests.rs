// Integration tests for the workflow orchestrator against a mock backend.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use autolabo::workflow::{
    DEFAULT_AUTHOR, DEFAULT_INSTITUTION, DEFAULT_TEMPLATE_ID, DEFAULT_TITLE, MSG_EMPTY_TRANSCRIPT,
    MSG_NO_AUDIO, MSG_TEXT_TIMEOUT, PARTIAL_NOTICE,
};
use autolabo::{
    BackendClient, CaptureChunk, CaptureFormat, CorrectionStatus, RecordingArtifact, ReportMethod,
    WorkflowOrchestrator, WorkflowStep,
};
use common::{
    spawn_backend, MockBehavior, MOCK_CLEANED_TEXT, MOCK_CORRECTED_TEXT, MOCK_ORIGINAL_TRANSCRIPT,
    MOCK_TRANSCRIPT,
};
use tempfile::TempDir;

fn client_for(base_url: &str) -> BackendClient {
    BackendClient::with_base_url(base_url.to_string())
}

fn scratch_wav(dir: &TempDir) -> PathBuf {
    let artifact = RecordingArtifact::from_chunks(
        &[CaptureChunk {
            samples: vec![0i16; 1600],
            timestamp_ms: 0,
        }],
        CaptureFormat::default(),
        1,
    )
    .unwrap();
    let path = dir.path().join("clip.wav");
    std::fs::write(&path, &artifact.bytes).unwrap();
    path
}

fn recorded_artifact() -> RecordingArtifact {
    RecordingArtifact::from_chunks(
        &[CaptureChunk {
            samples: vec![7i16; 800],
            timestamp_ms: 0,
        }],
        CaptureFormat::default(),
        1,
    )
    .unwrap()
}

async fn reach_editing(orchestrator: &WorkflowOrchestrator, dir: &TempDir) {
    let path = scratch_wav(dir);
    orchestrator.select_file(&path).await.unwrap();
    orchestrator.process().await.unwrap();
    assert_eq!(orchestrator.snapshot().await.step, WorkflowStep::Editing);
}

#[tokio::test]
async fn test_process_without_audio_source_is_rejected() {
    // No network call is made, so no backend is needed.
    let orchestrator =
        WorkflowOrchestrator::new(BackendClient::with_base_url("http://127.0.0.1:1".to_string()));

    assert!(orchestrator.process().await.is_err());

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Input);
    assert_eq!(session.error.as_deref(), Some(MSG_NO_AUDIO));
}

#[tokio::test]
async fn test_transcription_success_populates_and_advances() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();

    orchestrator.select_file(&scratch_wav(&dir)).await.unwrap();
    orchestrator.process().await.unwrap();

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Editing);
    assert_eq!(session.transcript.as_deref(), Some(MOCK_TRANSCRIPT));
    assert_eq!(
        session.original_transcript.as_deref(),
        Some(MOCK_ORIGINAL_TRANSCRIPT)
    );
    assert_eq!(session.edited_transcript, MOCK_TRANSCRIPT);
    // The audio source only survives on the input step.
    assert!(session.audio_source.is_none());
    assert!(session.error.is_none());
}

#[tokio::test]
async fn test_transcription_backend_error_keeps_input_step() {
    let backend = spawn_backend(MockBehavior {
        transcribe_error: Some("Failed to load Whisper model".to_string()),
        ..Default::default()
    })
    .await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();

    orchestrator.select_file(&scratch_wav(&dir)).await.unwrap();
    assert!(orchestrator.process().await.is_err());

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Input);
    let error = session.error.expect("error surfaced");
    assert!(error.contains("Failed to load Whisper model"));
    assert!(session.transcript.is_none());
}

#[tokio::test]
async fn test_invalid_file_is_rejected_before_any_call() {
    let orchestrator =
        WorkflowOrchestrator::new(BackendClient::with_base_url("http://127.0.0.1:1".to_string()));
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not audio").unwrap();

    assert!(orchestrator.select_file(&path).await.is_err());

    let session = orchestrator.snapshot().await;
    assert!(session.error.is_some());
    assert!(session.audio_source.is_none());
}

#[tokio::test]
async fn test_recording_artifact_feeds_the_workflow() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));

    orchestrator.accept_recording(recorded_artifact()).await;
    assert!(orchestrator.snapshot().await.has_audio_source());

    orchestrator.process().await.unwrap();
    assert_eq!(orchestrator.snapshot().await.step, WorkflowStep::Editing);
}

#[tokio::test]
async fn test_recording_replaces_uploaded_file() {
    let orchestrator =
        WorkflowOrchestrator::new(BackendClient::with_base_url("http://127.0.0.1:1".to_string()));
    let dir = TempDir::new().unwrap();

    orchestrator.select_file(&scratch_wav(&dir)).await.unwrap();
    orchestrator.accept_recording(recorded_artifact()).await;

    let session = orchestrator.snapshot().await;
    assert!(matches!(
        session.audio_source,
        Some(autolabo::AudioSource::Recording(_))
    ));
}

#[tokio::test]
async fn test_artifact_outside_input_step_is_dropped() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.accept_recording(recorded_artifact()).await;
    assert!(orchestrator.snapshot().await.audio_source.is_none());
}

#[tokio::test]
async fn test_generate_report_success_advances_to_report() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.generate_report().await.unwrap();

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Report);
    assert_eq!(session.report_method, Some(ReportMethod::Ollama));
    assert!(session.report.unwrap().contains("Relazione"));
}

#[tokio::test]
async fn test_generate_report_rejected_on_empty_transcript() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.set_edited_transcript("   ").await;
    assert!(orchestrator.generate_report().await.is_err());

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Editing);
    assert_eq!(session.error.as_deref(), Some(MSG_EMPTY_TRANSCRIPT));
    assert!(session.report.is_none());
}

#[tokio::test]
async fn test_grammar_correction_replaces_edited_text() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let mut orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.correct_grammar().await.unwrap();

    let session = orchestrator.snapshot().await;
    assert_eq!(session.edited_transcript, MOCK_CORRECTED_TEXT);
    assert_eq!(session.correction_status, CorrectionStatus::Success);
    assert_eq!(session.step, WorkflowStep::Editing);
}

#[tokio::test]
async fn test_filler_cleanup_replaces_edited_text() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let mut orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.clean_filler().await.unwrap();

    let session = orchestrator.snapshot().await;
    assert_eq!(session.edited_transcript, MOCK_CLEANED_TEXT);
    assert_eq!(session.correction_status, CorrectionStatus::Success);
}

#[tokio::test]
async fn test_correction_timeout_leaves_text_unchanged() {
    let backend = spawn_backend(MockBehavior {
        slow_text: Some(Duration::from_secs(2)),
        ..Default::default()
    })
    .await;
    let client = client_for(&backend.base_url).with_timeouts(
        Duration::from_secs(30),
        Some(Duration::from_millis(200)),
        None,
    );
    let mut orchestrator = WorkflowOrchestrator::new(client);
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    assert!(orchestrator.correct_grammar().await.is_err());

    let session = orchestrator.snapshot().await;
    // The field is never corrupted by a timed-out correction.
    assert_eq!(session.edited_transcript, MOCK_TRANSCRIPT);
    assert_eq!(session.correction_status, CorrectionStatus::Error);
    assert_eq!(session.error.as_deref(), Some(MSG_TEXT_TIMEOUT));
    assert_eq!(session.step, WorkflowStep::Editing);
}

#[tokio::test]
async fn test_correction_status_resets_after_delay() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let mut orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    orchestrator.correct_grammar().await.unwrap();
    assert_eq!(
        orchestrator.snapshot().await.correction_status,
        CorrectionStatus::Success
    );

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(
        orchestrator.snapshot().await.correction_status,
        CorrectionStatus::Idle
    );
}

#[tokio::test]
async fn test_report_timeout_yields_partial_report_and_advances() {
    let backend = spawn_backend(MockBehavior {
        slow_report: Some(Duration::from_secs(2)),
        ..Default::default()
    })
    .await;
    let client = client_for(&backend.base_url).with_timeouts(
        Duration::from_secs(30),
        Some(Duration::from_secs(5)),
        Some(Duration::from_millis(200)),
    );
    let orchestrator = WorkflowOrchestrator::new(client);
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;

    // Unlike text corrections, an elapsed report bound still advances.
    orchestrator.generate_report().await.unwrap();

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Report);
    assert_eq!(session.report_method, Some(ReportMethod::Local));
    let report = session.report.unwrap();
    assert!(report.contains(PARTIAL_NOTICE));
    assert!(report.contains(MOCK_TRANSCRIPT));
}

#[tokio::test]
async fn test_back_and_forward_preserve_accumulated_state() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;
    orchestrator.generate_report().await.unwrap();

    orchestrator.back().await;
    assert_eq!(orchestrator.snapshot().await.step, WorkflowStep::Editing);
    orchestrator.back().await;
    assert_eq!(orchestrator.snapshot().await.step, WorkflowStep::Input);

    let session = orchestrator.snapshot().await;
    assert!(session.transcript.is_some());
    assert!(session.report.is_some());

    orchestrator.forward().await;
    assert_eq!(orchestrator.snapshot().await.step, WorkflowStep::Editing);
    orchestrator.forward().await;

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Report);
    assert!(session.report.is_some());
}

#[tokio::test]
async fn test_reset_returns_every_field_to_default() {
    let backend = spawn_backend(MockBehavior::default()).await;
    let mut orchestrator = WorkflowOrchestrator::new(client_for(&backend.base_url));
    let dir = TempDir::new().unwrap();
    reach_editing(&orchestrator, &dir).await;
    orchestrator
        .set_metadata(autolabo::ReportMetadata {
            title: "Esperimento".to_string(),
            author: "Mario".to_string(),
            institution: "Politecnico".to_string(),
        })
        .await;
    orchestrator.set_template("thesis_chapter").await;
    orchestrator.generate_report().await.unwrap();

    orchestrator.reset().await;

    let session = orchestrator.snapshot().await;
    assert_eq!(session.step, WorkflowStep::Input);
    assert!(session.audio_source.is_none());
    assert!(session.transcript.is_none());
    assert!(session.original_transcript.is_none());
    assert!(session.edited_transcript.is_empty());
    assert!(session.report.is_none());
    assert!(session.report_method.is_none());
    assert!(session.error.is_none());
    assert!(session.clean_filler_words);
    assert_eq!(session.correction_status, CorrectionStatus::Idle);
    assert_eq!(session.metadata.title, DEFAULT_TITLE);
    assert_eq!(session.metadata.author, DEFAULT_AUTHOR);
    assert_eq!(session.metadata.institution, DEFAULT_INSTITUTION);
    assert_eq!(session.selected_template, DEFAULT_TEMPLATE_ID);
}
