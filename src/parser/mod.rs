//! Format parsers and the router that selects them.
//!
//! Each parser projects one source format into an
//! [`InternalDocument`]. The [`FormatRouter`] maps detected formats to
//! parsers and reports a conversion error for formats it cannot handle.
//!
//! # Example
//!
//! ```no_run
//! use doc2md::detect::FileFormat;
//! use doc2md::parser::FormatRouter;
//! use std::path::Path;
//!
//! fn main() -> doc2md::Result<()> {
//!     let router = FormatRouter::with_defaults();
//!     let parser = router.get_parser(FileFormat::Docx)?;
//!     let doc = parser.parse(Path::new("report.docx"))?;
//!     println!("{} sections", doc.sections.len());
//!     Ok(())
//! }
//! ```

mod docx;
mod pdf;
mod text;
mod xlsx;

pub use docx::DocxParser;
pub use pdf::PdfParser;
pub use text::{clean_inline, normalize_text};
pub use xlsx::{sheet_to_section, XlsxParser, EMPTY_SHEET};

use crate::detect::FileFormat;
use crate::error::{Error, Result};
use crate::model::InternalDocument;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Trait for format parsers.
///
/// Implementations return [`Error::NotImplemented`] for inputs they
/// recognize but cannot convert, and [`Error::Parse`] or
/// [`Error::Corrupted`] for damaged content.
pub trait DocumentParser: Send + Sync {
    /// Get the name of this parser.
    fn name(&self) -> &str;

    /// Formats this parser handles.
    fn formats(&self) -> &[FileFormat];

    /// Parse the file at `path`.
    fn parse(&self, path: &Path) -> Result<InternalDocument>;
}

/// Maps file formats to parsers.
pub struct FormatRouter {
    parsers: HashMap<FileFormat, Arc<dyn DocumentParser>>,
}

impl FormatRouter {
    /// Create an empty router.
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    /// Create a router with the DOCX, XLSX and PDF parsers.
    pub fn with_defaults() -> Self {
        let mut router = Self::new();
        router.register(Arc::new(DocxParser::new()));
        router.register(Arc::new(XlsxParser::new()));
        router.register(Arc::new(PdfParser::new()));
        router
    }

    /// Register a parser for all of its formats, replacing earlier ones.
    pub fn register(&mut self, parser: Arc<dyn DocumentParser>) {
        for format in parser.formats() {
            self.parsers.insert(*format, parser.clone());
        }
    }

    /// Get the parser for `format`.
    pub fn get_parser(&self, format: FileFormat) -> Result<Arc<dyn DocumentParser>> {
        if format == FileFormat::Unknown {
            return Err(Error::NoParser(format.to_string()));
        }
        self.parsers
            .get(&format)
            .cloned()
            .ok_or_else(|| Error::NoParser(format.to_string()))
    }

    /// Check if a format has a parser.
    pub fn supports(&self, format: FileFormat) -> bool {
        self.parsers.contains_key(&format)
    }
}

impl Default for FormatRouter {
    fn default() -> Self {
        Self::with_defaults()
    }
}
