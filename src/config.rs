//! Conversion configuration.
//!
//! [`ConversionConfig`] is an immutable snapshot of every user-facing option.
//! It is persisted as a YAML mapping (runtime path fields are never written),
//! and combined with command-line values through the pure [`ConversionConfig::merge`].

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Pipe table layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// `| a | b |` with `| --- |` separators
    #[default]
    Standard,
    /// `|a|b|` with minimal whitespace
    Compact,
    /// Column-padded cells with aligned borders
    Grid,
}

impl FromStr for TableStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(TableStyle::Standard),
            "compact" => Ok(TableStyle::Compact),
            "grid" => Ok(TableStyle::Grid),
            other => Err(Error::Config(format!("Unknown table style: {}", other))),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    /// Equivalent filter for the `log` facade.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }

    /// Parse a level name, falling back to `Info` for anything unrecognized.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("Unknown log level: {}", other))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(LogLevel::parse_lenient(&s))
    }
}

/// All options controlling a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Input document (runtime only)
    #[serde(skip)]
    pub input_path: Option<PathBuf>,

    /// Output Markdown file; stdout when absent (runtime only)
    #[serde(skip)]
    pub output_path: Option<PathBuf>,

    /// Configuration file this snapshot was loaded from (runtime only)
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Shift applied to every heading level before clamping to 1-6
    pub heading_offset: i32,

    /// Pipe table layout
    pub table_style: TableStyle,

    /// Prepend YAML front-matter
    pub include_metadata: bool,

    /// Encoding label for written files
    pub output_encoding: String,

    /// Write embedded images next to the output
    pub extract_images: bool,

    /// Inline images as base64 data URLs
    pub embed_images_base64: bool,

    /// Run OCR on extracted images when an engine is available
    pub enable_ocr: bool,

    /// OCR language hint, e.g. "eng+jpn"
    pub ocr_language: String,

    /// Print the first lines instead of writing
    pub preview_mode: bool,

    /// Run the pipeline without writing anything
    pub dry_run: bool,

    /// Check the produced Markdown for structural problems
    pub validate_output: bool,

    pub log_level: LogLevel,

    pub log_file: Option<PathBuf>,

    /// Largest accepted input, in megabytes
    pub max_file_size_mb: u64,

    pub batch_mode: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            output_path: None,
            config_file: None,
            heading_offset: 0,
            table_style: TableStyle::Standard,
            include_metadata: false,
            output_encoding: "utf-8".to_string(),
            extract_images: true,
            embed_images_base64: false,
            enable_ocr: true,
            ocr_language: "eng+jpn".to_string(),
            preview_mode: false,
            dry_run: false,
            validate_output: true,
            log_level: LogLevel::Info,
            log_file: None,
            max_file_size_mb: 100,
            batch_mode: false,
        }
    }
}

impl ConversionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file.
    ///
    /// An empty file yields the defaults. Unknown keys are ignored.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let text = fs::read_to_string(path)?;
        let value: serde_yaml::Value = if text.trim().is_empty() {
            serde_yaml::Value::Null
        } else {
            serde_yaml::from_str(&text)?
        };

        let mut config = match value {
            serde_yaml::Value::Null => Self::default(),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)?,
            _ => {
                return Err(Error::Config(format!(
                    "Configuration file must contain a YAML mapping: {}",
                    path.display()
                )))
            }
        };
        config.config_file = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save the persistent fields as YAML, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Write a commented sample configuration holding every default.
    pub fn write_sample<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_yaml::to_string(&Self::default())?;
        let text = format!(
            "# doc2md configuration\n\
             #\n\
             # Values given on the command line override the ones below\n\
             # whenever they differ from the built-in defaults.\n\
             #\n\
             # table_style: standard | compact | grid\n\
             # log_level: DEBUG | INFO | WARNING | ERROR\n\
             \n{}",
            body
        );
        fs::write(path, text)?;
        Ok(())
    }

    /// Combine a file configuration with command-line values.
    ///
    /// Runtime path fields always come from `cli`. Every other field takes
    /// the `cli` value when it differs from its default, else the file value.
    pub fn merge(file: Option<&Self>, cli: &Self) -> Self {
        let Some(file) = file else {
            return cli.clone();
        };
        let defaults = Self::default();

        macro_rules! pick {
            ($field:ident) => {
                if cli.$field != defaults.$field {
                    cli.$field.clone()
                } else {
                    file.$field.clone()
                }
            };
        }

        Self {
            input_path: cli.input_path.clone(),
            output_path: cli.output_path.clone(),
            config_file: cli.config_file.clone().or_else(|| file.config_file.clone()),
            heading_offset: pick!(heading_offset),
            table_style: pick!(table_style),
            include_metadata: pick!(include_metadata),
            output_encoding: pick!(output_encoding),
            extract_images: pick!(extract_images),
            embed_images_base64: pick!(embed_images_base64),
            enable_ocr: pick!(enable_ocr),
            ocr_language: pick!(ocr_language),
            preview_mode: pick!(preview_mode),
            dry_run: pick!(dry_run),
            validate_output: pick!(validate_output),
            log_level: pick!(log_level),
            log_file: pick!(log_file),
            max_file_size_mb: pick!(max_file_size_mb),
            batch_mode: pick!(batch_mode),
        }
    }

    /// Per-file copy for batch mode: output goes next to the input with a
    /// `.md` extension.
    pub fn for_batch_file<P: AsRef<Path>>(&self, input: P) -> Self {
        let input = input.as_ref();
        Self {
            input_path: Some(input.to_path_buf()),
            output_path: Some(input.with_extension("md")),
            batch_mode: true,
            ..self.clone()
        }
    }

    /// Set the input path.
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the heading offset.
    pub fn with_heading_offset(mut self, offset: i32) -> Self {
        self.heading_offset = offset;
        self
    }

    /// Set the table style.
    pub fn with_table_style(mut self, style: TableStyle) -> Self {
        self.table_style = style;
        self
    }

    /// Enable or disable front-matter.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Set the output encoding label.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.output_encoding = encoding.into();
        self
    }

    /// Enable or disable image extraction.
    pub fn with_extract_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Enable or disable base64 image embedding.
    pub fn with_embed_images(mut self, embed: bool) -> Self {
        self.embed_images_base64 = embed;
        self
    }

    /// Enable or disable preview mode.
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview_mode = preview;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable output validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_output = validate;
        self
    }

    /// Set the maximum input size in megabytes.
    pub fn with_max_file_size(mut self, mb: u64) -> Self {
        self.max_file_size_mb = mb;
        self
    }
}
