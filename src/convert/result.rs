//! Per-file conversion outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How a conversion ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversionStatus {
    /// Output was produced from the parsed document
    Success,
    /// Placeholder output was produced after a parse failure (dry-run and
    /// preview only)
    PartialSuccess,
    #[default]
    Failure,
}

impl ConversionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionStatus::Success => "success",
            ConversionStatus::PartialSuccess => "partial",
            ConversionStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected while converting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Pages (PDF) or sheets (XLSX), when the source reports them
    pub pages: u32,
    pub images_found: usize,
    /// Image files written to disk
    pub images_extracted: usize,
    pub ocr_applied: usize,
    pub tables_converted: usize,
    pub headings_detected: usize,
}

/// Result of converting one file.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub status: ConversionStatus,
    pub input_path: PathBuf,
    /// Output file; `None` for stdout
    pub output_path: Option<PathBuf>,
    /// Rendered Markdown, when the pipeline got that far
    pub markdown_content: Option<String>,
    pub duration: Duration,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ConversionStats,
}

impl ConversionResult {
    /// Create an empty, failed result for `input_path`.
    pub fn new(input_path: impl Into<PathBuf>, output_path: Option<PathBuf>) -> Self {
        Self {
            status: ConversionStatus::Failure,
            input_path: input_path.into(),
            output_path,
            markdown_content: None,
            duration: Duration::ZERO,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ConversionStats::default(),
        }
    }

    /// True for full and partial success.
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            ConversionStatus::Success | ConversionStatus::PartialSuccess
        )
    }

    pub fn is_partial(&self) -> bool {
        self.status == ConversionStatus::PartialSuccess
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Where the output went, for messages: the file path or `stdout`.
    pub fn destination(&self) -> String {
        self.output_path
            .as_deref()
            .map(Path::display)
            .map(|d| d.to_string())
            .unwrap_or_else(|| "stdout".to_string())
    }
}
