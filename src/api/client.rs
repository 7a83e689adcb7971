//! HTTP client for the transcription/report backend.
//!
//! Wraps the seven endpoints the workflow consumes. Transcription and the
//! text-transform calls carry a client-side bound; report generation is
//! unbounded unless explicitly configured.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::types::*;
use crate::config::{BackendConfig, DEFAULT_BACKEND_URL};

/// Default upper bound for a transcription request.
pub const DEFAULT_TRANSCRIBE_TIMEOUT_SECS: u64 = 300;

/// Default upper bound for grammar-correction and filler-cleanup requests.
pub const DEFAULT_TEXT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
    transcribe_timeout: Duration,
    text_timeout: Option<Duration>,
    report_timeout: Option<Duration>,
}

impl Default for BackendClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BACKEND_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        // No global timeout on the client itself: report generation is
        // allowed to run unbounded. Bounds are applied per request.
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            client,
            transcribe_timeout: Duration::from_secs(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            text_timeout: Some(Duration::from_secs(DEFAULT_TEXT_TIMEOUT_SECS)),
            report_timeout: None,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let mut client = Self::with_base_url(config.base_url.clone());
        client.transcribe_timeout = Duration::from_secs(config.transcribe_timeout_secs);
        client.text_timeout = config.text_timeout_secs.map(Duration::from_secs);
        client.report_timeout = config.report_timeout_secs.map(Duration::from_secs);
        client
    }

    /// Override the request bounds. `None` disables the bound for that call
    /// class entirely.
    pub fn with_timeouts(
        mut self,
        transcribe: Duration,
        text: Option<Duration>,
        report: Option<Duration>,
    ) -> Self {
        self.transcribe_timeout = transcribe;
        self.text_timeout = text;
        self.report_timeout = report;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn report_timeout(&self) -> Option<Duration> {
        self.report_timeout
    }

    /// `POST /api/transcribe`: upload audio bytes for transcription.
    pub async fn transcribe(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        mime: &str,
        clean_filler_words: bool,
    ) -> Result<TranscribeResponse, ApiError> {
        let url = format!("{}/api/transcribe", self.base_url);
        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("clean_filler_words", clean_filler_words.to_string());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.transcribe_timeout)
            .send()
            .await
            .map_err(|e| self.send_error(e, Some(self.transcribe_timeout)))?;

        parse_body(response).await
    }

    /// `POST /api/generate-report`: generate a structured report from a
    /// transcript. Unbounded unless a report timeout is configured.
    pub async fn generate_report(
        &self,
        transcript: &str,
        template_id: &str,
        metadata: &ReportMetadata,
    ) -> Result<ReportResponse, ApiError> {
        let url = format!("{}/api/generate-report", self.base_url);
        let body = ReportRequest {
            transcript,
            template_id,
            metadata,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(bound) = self.report_timeout {
            request = request.timeout(bound);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.send_error(e, self.report_timeout))?;

        parse_body(response).await
    }

    /// `POST /api/correct-text`: rewrite text for grammar and style.
    pub async fn correct_text(&self, text: &str, style: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/correct-text", self.base_url);
        let body = CorrectTextRequest { text, style };

        let mut request = self.client.post(&url).json(&body);
        if let Some(bound) = self.text_timeout {
            request = request.timeout(bound);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.send_error(e, self.text_timeout))?;

        let parsed: CorrectTextResponse = parse_body(response).await?;
        Ok(parsed.corrected_text)
    }

    /// `POST /api/clean-transcript`: remove discourse filler words.
    pub async fn clean_transcript(&self, text: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/clean-transcript", self.base_url);
        let body = CleanTranscriptRequest { text };

        let mut request = self.client.post(&url).json(&body);
        if let Some(bound) = self.text_timeout {
            request = request.timeout(bound);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.send_error(e, self.text_timeout))?;

        let parsed: CleanTranscriptResponse = parse_body(response).await?;
        Ok(parsed.cleaned_text)
    }

    /// `GET /api/templates`
    pub async fn fetch_templates(&self) -> Result<TemplateCatalog, ApiError> {
        self.get_json("/api/templates").await
    }

    /// `GET /api/memory-stats`
    pub async fn memory_stats(&self) -> Result<MemoryStats, ApiError> {
        self.get_json("/api/memory-stats").await
    }

    /// `GET /api/ollama-status`
    pub async fn ollama_status(&self) -> Result<OllamaStatus, ApiError> {
        self.get_json("/api/ollama-status").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(DEFAULT_TEXT_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| self.send_error(e, Some(Duration::from_secs(DEFAULT_TEXT_TIMEOUT_SECS))))?;

        parse_body(response).await
    }

    fn send_error(&self, error: reqwest::Error, bound: Option<Duration>) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(bound.map(|d| d.as_secs()).unwrap_or(0))
        } else {
            ApiError::Connection(error.to_string())
        }
    }
}

/// Parse a backend response, surfacing the `error` envelope the backend
/// uses both on error statuses and inside 200 bodies.
async fn parse_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Connection(e.to_string()))?;

    if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
        return Err(ApiError::Backend(body.error));
    }

    if !status.is_success() {
        return Err(ApiError::Server {
            status: status.as_u16(),
            message: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
}
