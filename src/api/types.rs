use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response from `POST /api/transcribe`
#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub transcript: String,
    pub original_transcript: String,
    pub cleaned: bool,
}

/// Report header fields, fully user-editable before generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportMetadata {
    pub title: String,
    pub author: String,
    pub institution: String,
}

/// Request body for `POST /api/generate-report`
#[derive(Debug, Serialize)]
pub struct ReportRequest<'a> {
    pub transcript: &'a str,
    #[serde(rename = "templateId")]
    pub template_id: &'a str,
    pub metadata: &'a ReportMetadata,
}

/// Which backend strategy produced the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMethod {
    Ollama,
    Local,
}

impl std::fmt::Display for ReportMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportMethod::Ollama => write!(f, "ollama"),
            ReportMethod::Local => write!(f, "local"),
        }
    }
}

/// Response from `POST /api/generate-report`
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    pub report: String,
    pub template: String,
    pub method: ReportMethod,
}

#[derive(Debug, Serialize)]
pub struct CorrectTextRequest<'a> {
    pub text: &'a str,
    pub style: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CorrectTextResponse {
    pub corrected_text: String,
}

#[derive(Debug, Serialize)]
pub struct CleanTranscriptRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CleanTranscriptResponse {
    pub cleaned_text: String,
}

/// A report-structure descriptor from `GET /api/templates`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub description: String,
    pub sections: Vec<String>,
    pub icon: String,
}

pub type TemplateCatalog = HashMap<String, Template>;

/// GPU memory as reported by `GET /api/memory-stats`: either a free-form
/// message ("N/A", "CUDA not available") or a free/total usage pair in GB.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GpuMemory {
    Usage { free: f64, total: f64 },
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryInfo {
    pub gpu: GpuMemory,
    #[serde(default)]
    pub torch_cuda_available: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelStates {
    pub whisper_loaded: bool,
    pub cuda_available: bool,
    pub device: String,
}

/// Response from `GET /api/memory-stats`
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryStats {
    pub memory: MemoryInfo,
    pub models: ModelStates,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaModel {
    pub name: String,
}

/// Response from `GET /api/ollama-status`
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaStatus {
    pub status: String,
    #[serde(default)]
    pub models: Vec<OllamaModel>,
    #[serde(default)]
    pub current_model: Option<OllamaModel>,
    #[serde(default)]
    pub gpu_check: Option<String>,
}

/// Error envelope the backend uses across every endpoint.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
