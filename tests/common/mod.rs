// Shared mock backend for integration tests.
//
// Serves the endpoints the workflow consumes, with configurable failure
// and latency behavior per test.

#![allow(dead_code)]

use std::time::Duration;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const MOCK_TRANSCRIPT: &str = "T";
pub const MOCK_ORIGINAL_TRANSCRIPT: &str = "O";
pub const MOCK_CORRECTED_TEXT: &str = "Testo corretto.";
pub const MOCK_CLEANED_TEXT: &str = "Testo pulito.";
pub const MOCK_REPORT: &str = "# Relazione\n\n## Introduzione\nContenuto generato.";

#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Answer `/api/transcribe` with this error envelope.
    pub transcribe_error: Option<String>,
    /// Answer `/api/generate-report` with this error envelope.
    pub report_error: Option<String>,
    /// Delay the text-transform endpoints.
    pub slow_text: Option<Duration>,
    /// Delay report generation.
    pub slow_report: Option<Duration>,
}

pub struct MockBackend {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_backend(behavior: MockBehavior) -> MockBackend {
    let transcribe = {
        let behavior = behavior.clone();
        move || {
            let behavior = behavior.clone();
            async move {
                if let Some(error) = behavior.transcribe_error {
                    return Json(json!({ "error": error }));
                }
                Json(json!({
                    "transcript": MOCK_TRANSCRIPT,
                    "original_transcript": MOCK_ORIGINAL_TRANSCRIPT,
                    "cleaned": true
                }))
            }
        }
    };

    let generate_report = {
        let behavior = behavior.clone();
        move || {
            let behavior = behavior.clone();
            async move {
                if let Some(delay) = behavior.slow_report {
                    tokio::time::sleep(delay).await;
                }
                if let Some(error) = behavior.report_error {
                    return Json(json!({ "error": error }));
                }
                Json(json!({
                    "report": MOCK_REPORT,
                    "template": "lab_report",
                    "method": "ollama"
                }))
            }
        }
    };

    let correct_text = {
        let behavior = behavior.clone();
        move || {
            let behavior = behavior.clone();
            async move {
                if let Some(delay) = behavior.slow_text {
                    tokio::time::sleep(delay).await;
                }
                Json(json!({ "corrected_text": MOCK_CORRECTED_TEXT }))
            }
        }
    };

    let clean_transcript = {
        let behavior = behavior.clone();
        move || {
            let behavior = behavior.clone();
            async move {
                if let Some(delay) = behavior.slow_text {
                    tokio::time::sleep(delay).await;
                }
                Json(json!({ "cleaned_text": MOCK_CLEANED_TEXT }))
            }
        }
    };

    let app = Router::new()
        .route("/api/transcribe", post(transcribe))
        .route("/api/generate-report", post(generate_report))
        .route("/api/correct-text", post(correct_text))
        .route("/api/clean-transcript", post(clean_transcript))
        .route("/api/templates", get(templates))
        .route("/api/memory-stats", get(memory_stats))
        .route("/api/ollama-status", get(ollama_status));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{}", addr),
        handle,
    }
}

async fn templates() -> Json<Value> {
    Json(json!({
        "lab_report": {
            "name": "Relazione di Laboratorio",
            "description": "Template standard per relazioni di laboratorio scientifico",
            "sections": ["Introduzione", "Materiali e Metodi", "Risultati", "Discussione", "Conclusioni"],
            "icon": "🧪"
        },
        "technical_report": {
            "name": "Report Tecnico",
            "description": "Template per report tecnici ingegneristici",
            "sections": ["Sommario Esecutivo", "Obiettivi", "Risultati"],
            "icon": "⚙️"
        }
    }))
}

async fn memory_stats() -> Json<Value> {
    Json(json!({
        "memory": {
            "gpu": { "free": 3.2, "total": 8.0 },
            "torch_cuda_available": true
        },
        "models": {
            "whisper_loaded": true,
            "cuda_available": true,
            "device": "cuda"
        }
    }))
}

async fn ollama_status() -> Json<Value> {
    Json(json!({
        "status": "online",
        "models": [{ "name": "mistral:latest" }],
        "current_model": { "name": "mistral:latest" },
        "gpu_check": "Using GPU"
    }))
}
