//! Pre-flight checks on input files.

use crate::config::ConversionConfig;
use crate::detect::FileFormat;
use crate::error::{Error, ErrorKind, Result};
use std::fs::File;
use std::path::Path;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Outcome of validating one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileValidation {
    pub valid: bool,
    /// Kind of the first failing check
    pub error_type: Option<ErrorKind>,
    pub message: Option<String>,
    /// Detected format (`Unknown` when the format check failed or was not reached)
    pub format: FileFormat,
    /// File size in bytes, when known
    pub size: Option<u64>,
}

/// Checks existence, format, size and readability, in that order, and
/// reports the first failure only.
#[derive(Debug, Clone, Copy)]
pub struct FileValidator {
    max_size_mb: u64,
}

impl FileValidator {
    pub fn new(max_size_mb: u64) -> Self {
        Self { max_size_mb }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.max_file_size_mb)
    }

    /// Run every check and return the detected format and size.
    pub fn check<P: AsRef<Path>>(&self, path: P) -> Result<(FileFormat, u64)> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let format = FileFormat::from_path(path);
        if format == FileFormat::Unknown {
            let suffix = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            return Err(Error::InvalidFormat(suffix));
        }

        let size = path.metadata()?.len();
        if size > self.max_size_mb.saturating_mul(BYTES_PER_MB) {
            return Err(Error::FileTooLarge {
                size_mb: size as f64 / BYTES_PER_MB as f64,
                max_mb: self.max_size_mb,
            });
        }

        if File::open(path).is_err() {
            return Err(Error::FileNotReadable(path.to_path_buf()));
        }

        Ok((format, size))
    }

    /// Validate `path`, reporting the first failing check.
    pub fn validate<P: AsRef<Path>>(&self, path: P) -> FileValidation {
        match self.check(path) {
            Ok((format, size)) => FileValidation {
                valid: true,
                error_type: None,
                message: None,
                format,
                size: Some(size),
            },
            Err(err) => FileValidation {
                valid: false,
                error_type: Some(err.kind()),
                message: Some(err.to_string()),
                format: FileFormat::Unknown,
                size: None,
            },
        }
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(ConversionConfig::default().max_file_size_mb)
    }
}
