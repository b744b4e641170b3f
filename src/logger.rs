//! Conversion logger handle.
//!
//! A [`Logger`] is created once per invocation and handed to every
//! orchestrator. Records go through the `log` facade (target `doc2md`) and,
//! when a log file is configured, are appended to it as
//! `<timestamp> - doc2md - <LEVEL> - <message>`.

use crate::config::{ConversionConfig, LogLevel};
use crate::error::Result;
use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TARGET: &str = "doc2md";

/// Cheaply cloneable, append-only logger.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    level: LogLevel,
    enabled: bool,
    file: Option<Mutex<File>>,
}

impl Logger {
    /// Create a logger with a level threshold and an optional log file.
    pub fn new(level: LogLevel, log_file: Option<&Path>) -> Result<Self> {
        let file = match log_file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Mutex::new(file))
            }
            None => None,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                level,
                enabled: true,
                file,
            }),
        })
    }

    /// Create a logger from the level and file in `config`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self> {
        Self::new(config.log_level, config.log_file.as_deref())
    }

    /// A logger that discards everything.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                level: LogLevel::Error,
                enabled: false,
                file: None,
            }),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.inner.level
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Info, message.as_ref());
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Error, message.as_ref());
    }

    /// Record the start of a conversion.
    pub fn conversion_start(&self, input: &Path, size: u64) {
        self.info(format!(
            "Starting conversion - File: {}, Size: {} bytes",
            input.display(),
            size
        ));
    }

    /// Record the end of a successful conversion.
    pub fn conversion_complete(&self, destination: &str, duration: Duration) {
        self.info(format!(
            "Conversion complete - Output: {}, Duration: {:.2}s",
            destination,
            duration.as_secs_f64()
        ));
    }

    /// Flush the log file, if any.
    pub fn flush(&self) {
        if let Some(file) = &self.inner.file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if !self.inner.enabled || level < self.inner.level {
            return;
        }

        let facade_level = match level {
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        };
        log::log!(target: TARGET, facade_level, "{}", message);

        if let Some(file) = &self.inner.file {
            let line = format!(
                "{} - {} - {} - {}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                TARGET,
                level,
                message
            );
            if let Ok(mut f) = file.lock() {
                let _ = f.write_all(line.as_bytes());
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.inner.level)
            .field("enabled", &self.inner.enabled)
            .field("file", &self.inner.file.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_sink_respects_level() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/run.log");
        let logger = Logger::new(LogLevel::Warning, Some(&path)).unwrap();

        logger.info("quiet");
        logger.warning("careful");
        logger.clone().error("broken");
        logger.flush();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("quiet"));
        assert!(text.contains(" - doc2md - WARNING - careful"));
        assert!(text.contains(" - doc2md - ERROR - broken"));
    }

    #[test]
    fn test_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.log");
        Logger::new(LogLevel::Info, Some(&path)).unwrap().info("one");
        Logger::new(LogLevel::Info, Some(&path)).unwrap().info("two");

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_disabled() {
        let logger = Logger::disabled();
        logger.error("nothing happens");
        assert_eq!(logger.level(), LogLevel::Error);
    }
}
