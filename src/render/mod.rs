//! Rendering a [`DocumentModel`] to output bytes.
//!
//! Renderers hold their configuration and turn a finished document into
//! bytes; they never make layout decisions the assembler already made
//! (page-break hints are followed, not recomputed).

mod pdf;
mod text;

pub use pdf::PdfRenderer;
pub use text::TextRenderer;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::report::{DocumentModel, PageMetrics};

/// Something that can turn a document model into a file.
pub trait Renderer {
    fn render(&self, doc: &DocumentModel) -> Result<Vec<u8>>;
}

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Text => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Text => "text/plain; charset=utf-8",
        }
    }

    /// Renderer for this format.
    pub fn renderer(self, metrics: PageMetrics) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Pdf => Box::new(PdfRenderer::with_metrics(metrics)),
            OutputFormat::Text => Box::new(TextRenderer::new()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "text" | "txt" => Ok(OutputFormat::Text),
            other => Err(Error::Config(format!(
                "unknown output format {other:?} (expected pdf or text)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Text => "text",
        })
    }
}

const FALLBACK_NAME: &str = "scorm-report";
const MAX_NAME_CHARS: usize = 80;

/// Download name for a report: `<title>_<YYYYmmdd_HHMMSS>.<ext>`, with the
/// title reduced to `[A-Za-z0-9_-]`.
pub fn report_filename(title: &str, timestamp: DateTime<Utc>, format: OutputFormat) -> String {
    let mut name = String::new();
    for c in title.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && (name.is_empty() || name.ends_with('_')) {
            continue;
        }
        name.push(c);
    }
    let name: String = name.trim_end_matches('_').chars().take(MAX_NAME_CHARS).collect();
    let name = if name.is_empty() { FALLBACK_NAME } else { name.as_str() };

    format!(
        "{name}_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!(matches!("docx".parse::<OutputFormat>(), Err(Error::Config(_))));
        assert_eq!(OutputFormat::Text.extension(), "txt");
        assert_eq!(OutputFormat::Pdf.mime_type(), "application/pdf");
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename("Intro to Safety: Part 1/2", ts(), OutputFormat::Pdf),
            "Intro_to_Safety_Part_1_2_20240309_070501.pdf"
        );
        assert_eq!(
            report_filename("../../etc/passwd", ts(), OutputFormat::Text),
            "etc_passwd_20240309_070501.txt"
        );
        assert_eq!(
            report_filename("Ünïcödé!!", ts(), OutputFormat::Pdf),
            "n_c_d_20240309_070501.pdf"
        );
        assert_eq!(
            report_filename("", ts(), OutputFormat::Pdf),
            "scorm-report_20240309_070501.pdf"
        );
    }
}
