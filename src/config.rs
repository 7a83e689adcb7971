use anyhow::Result;
use serde::Deserialize;

/// Fixed default for the transcription backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
    pub status: StatusConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the transcription/report backend.
    pub base_url: String,

    /// Upper bound for a transcription request, in seconds.
    pub transcribe_timeout_secs: u64,

    /// Upper bound for grammar-correction and filler-cleanup requests,
    /// in seconds. `None` disables the bound.
    pub text_timeout_secs: Option<u64>,

    /// Upper bound for report generation, in seconds. `None` (the default)
    /// leaves report generation unbounded; when a bound is set and elapses,
    /// a partial report is assembled locally instead of failing the step.
    pub report_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Interval between system-status polls, in seconds.
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Characters per line in the exported document.
    pub page_width: usize,
    /// Body lines per page.
    pub page_lines: usize,
}

impl Config {
    /// Load configuration from an optional file, falling back to defaults
    /// for every key the file does not set.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("backend.base_url", DEFAULT_BACKEND_URL)?
            .set_default("backend.transcribe_timeout_secs", 300i64)?
            // text_timeout_secs defaults to bounded; report_timeout_secs is
            // absent by default, which deserialises to None (unbounded).
            .set_default("backend.text_timeout_secs", 60i64)?
            .set_default("capture.sample_rate", 16000i64)?
            .set_default("capture.channels", 1i64)?
            .set_default("status.poll_interval_secs", 10i64)?
            .set_default("export.page_width", 80i64)?
            .set_default("export.page_lines", 54i64)?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
