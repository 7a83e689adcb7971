//! The four-step workflow: audio in, transcript out, edits, report.
//!
//! `WorkflowSession` is the single state aggregate; `WorkflowOrchestrator`
//! is the only place that mutates it, sequencing backend calls and
//! folding their failures into the session's `error` field.

mod orchestrator;
mod session;

pub use orchestrator::{
    WorkflowError, WorkflowOrchestrator, MSG_EMPTY_TRANSCRIPT, MSG_INVALID_AUDIO, MSG_NO_AUDIO,
    MSG_TEXT_TIMEOUT, PARTIAL_NOTICE,
};
pub use session::{
    AudioSource, CorrectionStatus, WorkflowSession, WorkflowStep, DEFAULT_AUTHOR,
    DEFAULT_CORRECTION_STYLE, DEFAULT_INSTITUTION, DEFAULT_TEMPLATE_ID, DEFAULT_TITLE,
};
