//! Error types for doc2md.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for doc2md operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used when reporting conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    InvalidFormat,
    FileTooLarge,
    FileNotReadable,
    FileCorrupted,
    ParseFailure,
    NotImplemented,
    SerializeFailure,
    WriteFailure,
    Config,
    Other,
}

/// Error types that can occur while converting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The input file has an unsupported extension.
    #[error("Invalid file format. Expected .docx, .xlsx, or .pdf, got: {0}")]
    InvalidFormat(String),

    /// The input file exceeds the configured size limit.
    #[error("File size ({size_mb:.2} MB) exceeds maximum allowed size ({max_mb} MB)")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    /// The input file exists but cannot be read.
    #[error("File is not readable. Check file permissions: {}", .0.display())]
    FileNotReadable(PathBuf),

    /// The container or file signature is damaged.
    #[error("Corrupted document: {0}")]
    Corrupted(String),

    /// No parser is registered for the detected format.
    #[error("No parser available for format: {0}")]
    NoParser(String),

    /// The format is recognized but parsing it is not supported.
    #[error("Parser not yet implemented: {0}")]
    NotImplemented(String),

    /// The document content could not be parsed.
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// The document model could not be rendered as Markdown.
    #[error("Failed to serialize to Markdown: {0}")]
    Serialize(String),

    /// Output could not be written.
    #[error("Failed to write output: {0}")]
    Write(String),

    /// The configured output encoding is unknown.
    #[error("Unsupported output encoding: {0}")]
    UnsupportedEncoding(String),

    /// The configuration file is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FileNotFound(_) => ErrorKind::FileNotFound,
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            Error::FileNotReadable(_) => ErrorKind::FileNotReadable,
            Error::Corrupted(_) => ErrorKind::FileCorrupted,
            Error::NoParser(_) | Error::Parse(_) => ErrorKind::ParseFailure,
            Error::NotImplemented(_) => ErrorKind::NotImplemented,
            Error::Serialize(_) => ErrorKind::SerializeFailure,
            Error::Write(_) | Error::UnsupportedEncoding(_) => ErrorKind::WriteFailure,
            Error::Config(_) | Error::Yaml(_) => ErrorKind::Config,
            Error::Io(_) | Error::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => Error::Parse("missing package part".into()),
            _ => Error::Corrupted(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Parse(format!("XML: {}", err))
    }
}

impl From<calamine::Error> for Error {
    fn from(err: calamine::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::NotImplemented("encrypted PDF".into()),
            _ => Error::Parse(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::Parse(err.to_string())
    }
}
