//! Document export for generated reports.
//!
//! Produces a paginated plain-text document: metadata header, separator,
//! the report body with markdown heading/emphasis markup stripped and
//! word-wrapped to the page width, and a fixed footer line on every page.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::api::ReportMetadata;
use crate::config::ExportConfig;

/// Footer printed at the bottom of every page.
pub const FOOTER_LINE: &str = "AutoLabo - Relazioni di laboratorio generate automaticamente";

/// Filename stem used when the report has no usable title.
pub const FALLBACK_STEM: &str = "relazione_laboratorio";

pub const EXTENSION: &str = "txt";

const PAGE_BREAK: &str = "\u{0c}\n";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Errore nella generazione del documento: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub page_width: usize,
    pub page_lines: usize,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            page_width: 80,
            page_lines: 54,
        }
    }
}

impl From<&ExportConfig> for DocumentLayout {
    fn from(config: &ExportConfig) -> Self {
        Self {
            page_width: config.page_width,
            page_lines: config.page_lines,
        }
    }
}

/// Default filename for a report title: lower-cased, spaces to
/// underscores; empty titles fall back to the fixed stem.
pub fn derive_filename(title: &str) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return format!("{}.{}", FALLBACK_STEM, EXTENSION);
    }
    let stem = trimmed.to_lowercase().replace(' ', "_");
    format!("{}.{}", stem, EXTENSION)
}

/// Remove markdown heading and emphasis markup, keeping the text.
pub fn strip_markdown(text: &str) -> String {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static BOLD_U: OnceLock<Regex> = OnceLock::new();
    static ITALIC: OnceLock<Regex> = OnceLock::new();
    static ITALIC_U: OnceLock<Regex> = OnceLock::new();

    let heading = HEADING.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
    let bold = BOLD.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
    let bold_u = BOLD_U.get_or_init(|| Regex::new(r"__([^_]+)__").unwrap());
    let italic = ITALIC.get_or_init(|| Regex::new(r"\*([^*]+)\*").unwrap());
    let italic_u = ITALIC_U.get_or_init(|| Regex::new(r"_([^_]+)_").unwrap());

    let text = heading.replace_all(text, "");
    let text = bold.replace_all(&text, "$1");
    let text = bold_u.replace_all(&text, "$1");
    let text = italic.replace_all(&text, "$1");
    let text = italic_u.replace_all(&text, "$1");
    text.into_owned()
}

/// Word-wrap a paragraph to the given width. Words longer than the width
/// get a line of their own.
fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }

    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            wrapped.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Render the complete paginated document.
pub fn render_document(
    metadata: &ReportMetadata,
    report: &str,
    layout: &DocumentLayout,
) -> String {
    let mut lines = vec![
        metadata.title.clone(),
        metadata.author.clone(),
        metadata.institution.clone(),
        "-".repeat(layout.page_width),
    ];

    let body = strip_markdown(report);
    for paragraph in body.lines() {
        lines.extend(wrap_line(paragraph, layout.page_width));
    }

    let footer = format!("{:^width$}", FOOTER_LINE, width = layout.page_width);
    let page_lines = layout.page_lines.max(1);

    let mut pages = Vec::new();
    for chunk in lines.chunks(page_lines) {
        let mut page = chunk.join("\n");
        page.push('\n');
        page.push('\n');
        page.push_str(&footer);
        page.push('\n');
        pages.push(page);
    }

    if pages.is_empty() {
        pages.push(format!("\n{}\n", footer));
    }

    pages.join(PAGE_BREAK)
}

/// Write the rendered document next to `output_dir`, deriving the
/// filename from the report title. Returns the path written.
pub fn export_report(
    metadata: &ReportMetadata,
    report: &str,
    output_dir: &Path,
    layout: &DocumentLayout,
) -> Result<PathBuf, ExportError> {
    let path = output_dir.join(derive_filename(&metadata.title));
    let document = render_document(metadata, report, layout);
    std::fs::write(&path, document)?;

    info!("Report exported to {}", path.display());
    Ok(path)
}
