//! # doc2md
//!
//! Office document to Markdown conversion library for Rust.
//!
//! Word (.docx), Excel (.xlsx) and PDF files are parsed into a
//! format-agnostic [`InternalDocument`], rendered as Markdown with
//! configurable heading offsets, table styles and front-matter, normalized by
//! a pretty printer, checked by a Markdown validator and written out.
//!
//! ## Quick Start
//!
//! ```no_run
//! use doc2md::{to_markdown_with_config, ConversionConfig, TableStyle};
//!
//! fn main() -> doc2md::Result<()> {
//!     let config = ConversionConfig::new()
//!         .with_heading_offset(1)
//!         .with_table_style(TableStyle::Grid);
//!     let markdown = to_markdown_with_config("report.docx", &config)?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! The [`Orchestrator`] runs the full pipeline for a file (or a batch of
//! files) and reports errors, warnings and statistics on a
//! [`ConversionResult`] instead of failing:
//!
//! ```no_run
//! use doc2md::{ConversionConfig, Logger, Orchestrator};
//! use std::path::PathBuf;
//!
//! let orchestrator = Orchestrator::new(ConversionConfig::new(), Logger::disabled());
//! let inputs = vec![PathBuf::from("a.docx"), PathBuf::from("b.pdf")];
//! for result in orchestrator.convert_batch(&inputs) {
//!     println!("{}: {}", result.input_path.display(), result.status);
//! }
//! ```

pub mod config;
pub mod convert;
pub mod detect;
pub mod error;
pub mod images;
pub mod logger;
pub mod model;
pub mod output;
pub mod parser;
pub mod render;
pub mod validate;

// Re-export commonly used types
pub use config::{ConversionConfig, LogLevel, TableStyle};
pub use convert::{ConversionResult, ConversionStats, ConversionStatus, Orchestrator};
pub use detect::{detect_format_from_bytes, FileFormat};
pub use error::{Error, ErrorKind, Result};
pub use images::{ExtractedImage, ImageExtractor, OcrEngine};
pub use logger::Logger;
pub use model::{
    Block, CodeBlock, DocumentMetadata, Heading, ImageReference, InternalDocument, Link,
    ListItem, ListKind, Paragraph, Resource, Section, Table, TextFormatting,
};
pub use parser::{DocumentParser, FormatRouter};
pub use render::{pretty_print, RenderOptions};
pub use validate::{FileValidator, MarkdownValidator, ValidationResult};

use std::path::Path;

/// Parse a document into the internal model, choosing the parser from the
/// file extension.
///
/// # Example
///
/// ```no_run
/// let doc = doc2md::parse_file("budget.xlsx").unwrap();
/// println!("{} sheets", doc.sections.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<InternalDocument> {
    let path = path.as_ref();
    let (format, _) = FileValidator::default().check(path)?;
    FormatRouter::with_defaults().get_parser(format)?.parse(path)
}

/// Convert a document to Markdown with default settings.
///
/// # Example
///
/// ```no_run
/// let markdown = doc2md::to_markdown("report.docx").unwrap();
/// println!("{}", markdown);
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_config(path, &ConversionConfig::default())
}

/// Convert a document to Markdown using the rendering settings in `config`.
///
/// Images are referenced by id or embedded (with `embed_images_base64`);
/// nothing is written to disk.
pub fn to_markdown_with_config<P: AsRef<Path>>(
    path: P,
    config: &ConversionConfig,
) -> Result<String> {
    let path = path.as_ref();
    let (format, _) = FileValidator::from_config(config).check(path)?;
    let doc = FormatRouter::with_defaults().get_parser(format)?.parse(path)?;
    let markdown = render::serialize(&doc, config)?;
    Ok(render::PrettyPrinter::new(render::PrettyOptions::from_config(config)).format(&markdown))
}

/// Run the full conversion pipeline for `config.input_path`.
pub fn convert_file(config: ConversionConfig, logger: Logger) -> ConversionResult {
    Orchestrator::new(config, logger).convert()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("does/not/exist.docx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_to_markdown_rejects_unknown_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = to_markdown(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_convert_file_without_input() {
        let result = convert_file(ConversionConfig::new(), Logger::disabled());
        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 1);
    }
}
