//! Backend service contract
//!
//! The workflow consumes the transcription backend through this module:
//! - `POST /api/transcribe` (multipart audio upload)
//! - `POST /api/generate-report`
//! - `POST /api/correct-text` and `POST /api/clean-transcript`
//! - `GET /api/templates`
//! - `GET /api/memory-stats` and `GET /api/ollama-status`

mod client;
mod error;
mod types;

pub use client::{BackendClient, DEFAULT_TEXT_TIMEOUT_SECS, DEFAULT_TRANSCRIBE_TIMEOUT_SECS};
pub use error::ApiError;
pub use types::{
    GpuMemory, MemoryStats, OllamaModel, OllamaStatus, ReportMetadata, ReportMethod,
    ReportResponse, Template, TemplateCatalog, TranscribeResponse,
};
