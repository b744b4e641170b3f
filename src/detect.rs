//! Input format detection.
//!
//! The format of an input is decided by its extension (case-insensitive).
//! Parsers additionally check the container signature with
//! [`verify_signature`] so that a renamed or truncated file is reported as
//! corrupted instead of producing a confusing library error.

use crate::error::{Error, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Source document formats understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Docx,
    Xlsx,
    Pdf,
    Unknown,
}

/// ZIP local file header, used by OOXML packages.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";

impl FileFormat {
    /// Detect the format from a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => FileFormat::Docx,
            "xlsx" => FileFormat::Xlsx,
            "pdf" => FileFormat::Pdf,
            _ => FileFormat::Unknown,
        }
    }

    /// Detect the format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileFormat::Unknown)
    }

    /// Lowercase name of the format, as written to front-matter.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Docx => "docx",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Pdf => "pdf",
            FileFormat::Unknown => "unknown",
        }
    }

    /// Leading bytes every well-formed file of this format starts with.
    pub fn magic(&self) -> Option<&'static [u8]> {
        match self {
            FileFormat::Docx | FileFormat::Xlsx => Some(ZIP_MAGIC),
            FileFormat::Pdf => Some(PDF_MAGIC),
            FileFormat::Unknown => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the format of the given bytes from their signature.
///
/// OOXML packages cannot be told apart by signature alone, so any ZIP
/// container is reported as `Docx` unless the caller already knows better.
pub fn detect_format_from_bytes(data: &[u8]) -> FileFormat {
    if data.starts_with(PDF_MAGIC) {
        FileFormat::Pdf
    } else if data.starts_with(ZIP_MAGIC) {
        FileFormat::Docx
    } else {
        FileFormat::Unknown
    }
}

/// Check that the file at `path` starts with the signature of `format`.
pub fn verify_signature<P: AsRef<Path>>(path: P, format: FileFormat) -> Result<()> {
    let Some(magic) = format.magic() else {
        return Ok(());
    };

    let mut header = vec![0u8; magic.len()];
    let mut file = File::open(path.as_ref())?;
    let read = file.read(&mut header)?;

    if read < magic.len() || header != magic {
        return Err(Error::Corrupted(format!(
            "{} is not a valid {} file",
            path.as_ref().display(),
            format.as_str().to_uppercase()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(FileFormat::from_extension("DOCX"), FileFormat::Docx);
        assert_eq!(FileFormat::from_extension("Xlsx"), FileFormat::Xlsx);
        assert_eq!(FileFormat::from_extension("pdf"), FileFormat::Pdf);
        assert_eq!(FileFormat::from_extension("doc"), FileFormat::Unknown);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileFormat::from_path("a/b/report.PDF"), FileFormat::Pdf);
        assert_eq!(FileFormat::from_path("no_extension"), FileFormat::Unknown);
    }

    #[test]
    fn test_detect_from_bytes() {
        assert_eq!(detect_format_from_bytes(b"%PDF-1.7\n"), FileFormat::Pdf);
        assert_eq!(detect_format_from_bytes(b"PK\x03\x04rest"), FileFormat::Docx);
        assert_eq!(detect_format_from_bytes(b"hello"), FileFormat::Unknown);
    }

    #[test]
    fn test_verify_signature() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"not a pdf at all").unwrap();
        let err = verify_signature(file.path(), FileFormat::Pdf).unwrap_err();
        assert!(matches!(err, Error::Corrupted(_)));

        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.4\n").unwrap();
        assert!(verify_signature(file.path(), FileFormat::Pdf).is_ok());
    }
}
