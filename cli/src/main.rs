//! doc2md CLI - convert Word, Excel and PDF documents to Markdown

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use doc2md::{ConversionConfig, ConversionResult, LogLevel, Logger, Orchestrator, TableStyle};

#[derive(Parser, Debug)]
#[command(name = "doc2md")]
#[command(version)]
#[command(about = "Convert Word, Excel and PDF documents to Markdown", long_about = None)]
struct Cli {
    /// Input file (repeat for batch conversion)
    #[arg(
        short,
        long = "input",
        value_name = "FILE",
        action = ArgAction::Append,
        required_unless_present = "sample_config"
    )]
    inputs: Vec<PathBuf>,

    /// Output file (stdout if not specified; ignored in batch mode)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE", env = "DOC2MD_CONFIG")]
    config: Option<PathBuf>,

    /// Print the first 50 lines instead of writing
    #[arg(long)]
    preview: bool,

    /// Run the conversion without writing output
    #[arg(long)]
    dry_run: bool,

    /// Log level (DEBUG, INFO, WARNING, ERROR)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Append log records to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Write embedded images next to the output (default)
    #[arg(long, overrides_with = "no_extract_images")]
    extract_images: bool,

    /// Do not write embedded images
    #[arg(long)]
    no_extract_images: bool,

    /// Embed images as base64 data URLs
    #[arg(long)]
    embed_images_base64: bool,

    /// OCR language hint (e.g. "eng+jpn")
    #[arg(long, value_name = "LANG")]
    ocr_lang: Option<String>,

    /// Disable OCR on extracted images
    #[arg(long)]
    no_ocr: bool,

    /// Shift every heading level by this amount (clamped to 1-6)
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    heading_offset: Option<i32>,

    /// Prepend YAML front-matter with document metadata
    #[arg(long)]
    include_metadata: bool,

    /// Check the produced Markdown (default)
    #[arg(long, overrides_with = "no_validate")]
    validate: bool,

    /// Skip checking the produced Markdown
    #[arg(long)]
    no_validate: bool,

    /// Largest accepted input in megabytes
    #[arg(long, value_name = "MB")]
    max_file_size: Option<u64>,

    /// Table layout
    #[arg(long, value_enum)]
    table_style: Option<TableStyleArg>,

    /// Encoding of written files (e.g. utf-8, shift_jis)
    #[arg(long, value_name = "ENCODING")]
    output_encoding: Option<String>,

    /// Save the effective configuration to this file
    #[arg(long, value_name = "FILE")]
    save_config: Option<PathBuf>,

    /// Write a sample configuration file and exit
    #[arg(long, value_name = "FILE")]
    sample_config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TableStyleArg {
    /// `| a | b |` with `| --- |` separators
    Standard,
    /// `|a|b|` without padding
    Compact,
    /// Padded, aligned columns
    Grid,
}

impl From<TableStyleArg> for TableStyle {
    fn from(style: TableStyleArg) -> Self {
        match style {
            TableStyleArg::Standard => TableStyle::Standard,
            TableStyleArg::Compact => TableStyle::Compact,
            TableStyleArg::Grid => TableStyle::Grid,
        }
    }
}

impl Cli {
    /// Configuration holding only what was given on the command line; every
    /// other field keeps its default so that merging lets the file fill it.
    fn to_config(&self) -> ConversionConfig {
        let mut config = ConversionConfig::new();

        config.input_path = self.inputs.first().cloned();
        config.output_path = self.output.clone();
        config.config_file = self.config.clone();
        config.preview_mode = self.preview;
        config.dry_run = self.dry_run;
        config.embed_images_base64 = self.embed_images_base64;
        config.include_metadata = self.include_metadata;
        config.batch_mode = self.inputs.len() > 1;
        config.log_file = self.log_file.clone();

        if let Some(level) = &self.log_level {
            config.log_level = LogLevel::parse_lenient(level);
        }
        config.extract_images = self.extract_images || !self.no_extract_images;
        config.validate_output = self.validate || !self.no_validate;
        if self.no_ocr {
            config.enable_ocr = false;
        }
        if let Some(lang) = &self.ocr_lang {
            config.ocr_language = lang.clone();
        }
        if let Some(offset) = self.heading_offset {
            config.heading_offset = offset;
        }
        if let Some(mb) = self.max_file_size {
            config.max_file_size_mb = mb;
        }
        if let Some(style) = self.table_style {
            config.table_style = style.into();
        }
        if let Some(encoding) = &self.output_encoding {
            config.output_encoding = encoding.clone();
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.sample_config {
        match ConversionConfig::write_sample(path) {
            Ok(()) => {
                println!("{} {}", "Sample configuration written to".green(), path.display());
                return;
            }
            Err(e) => exit_with_error(&e),
        }
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => exit_with_error(&e),
    };

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .format_target(false)
        .init();

    let logger = match Logger::from_config(&config) {
        Ok(logger) => logger,
        Err(e) => exit_with_error(&e),
    };

    if let Some(path) = &cli.save_config {
        match config.save(path) {
            Ok(()) => logger.info(format!("Configuration saved to: {}", path.display())),
            Err(e) => exit_with_error(&e),
        }
    }

    let failed = if cli.inputs.len() > 1 {
        if cli.output.is_some() {
            eprintln!(
                "{}: --output is ignored in batch mode; each file is written next to its input",
                "Warning".yellow().bold()
            );
        }
        run_batch(&cli.inputs, config, logger.clone())
    } else {
        let result = Orchestrator::new(config, logger.clone()).convert();
        report(&result);
        !result.is_success()
    };

    logger.flush();
    if failed {
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> doc2md::Result<ConversionConfig> {
    let from_cli = cli.to_config();
    let from_file = match &cli.config {
        Some(path) => Some(ConversionConfig::load(path)?),
        None => None,
    };
    Ok(ConversionConfig::merge(from_file.as_ref(), &from_cli))
}

/// Convert every input, showing progress. Returns true if any file failed.
fn run_batch(inputs: &[PathBuf], config: ConversionConfig, logger: Logger) -> bool {
    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let orchestrator = Orchestrator::new(config, logger);
    let results = orchestrator.convert_batch_with(inputs, |_, result| {
        pb.set_message(file_name(&result.input_path));
        pb.inc(1);
    });
    pb.finish_and_clear();

    for result in &results {
        report(result);
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    let failed = results.len() - succeeded;
    let summary = format!(
        "Batch complete: {} succeeded, {} failed ({} files)",
        succeeded,
        failed,
        results.len()
    );
    if failed == 0 {
        eprintln!("\n{}", summary.green().bold());
    } else {
        eprintln!("\n{}", summary.red().bold());
    }
    failed > 0
}

/// Print errors, warnings and the outcome of one conversion to stderr.
fn report(result: &ConversionResult) {
    for error in &result.errors {
        eprintln!("{}: {}", "Error".red().bold(), error);
    }
    for warning in &result.warnings {
        eprintln!("{}: {}", "Warning".yellow(), warning);
    }

    if result.is_partial() {
        eprintln!(
            "{} {} ({:.2}s)",
            "Partially converted".yellow(),
            result.input_path.display(),
            result.duration.as_secs_f64()
        );
    } else if result.is_success() && result.output_path.is_some() {
        eprintln!(
            "{} {} -> {} ({:.2}s)",
            "Converted".green(),
            result.input_path.display(),
            result.destination(),
            result.duration.as_secs_f64()
        );
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn exit_with_error(err: &doc2md::Error) -> ! {
    eprintln!("{}: {}", "Error".red().bold(), err);
    process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("doc2md").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_library_defaults() {
        let cli = parse(&["-i", "a.docx"]);
        assert_eq!(cli.to_config(), ConversionConfig::new().with_input("a.docx"));
    }

    #[test]
    fn test_flags_map_to_config() {
        let cli = parse(&[
            "-i",
            "a.docx",
            "-o",
            "out.md",
            "--heading-offset",
            "-2",
            "--table-style",
            "grid",
            "--no-extract-images",
            "--no-validate",
            "--no-ocr",
            "--log-level",
            "debug",
            "--output-encoding",
            "shift_jis",
        ]);
        let config = cli.to_config();
        assert_eq!(config.heading_offset, -2);
        assert_eq!(config.table_style, TableStyle::Grid);
        assert!(!config.extract_images);
        assert!(!config.validate_output);
        assert!(!config.enable_ocr);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.output_encoding, "shift_jis");
        assert_eq!(config.output_path, Some(PathBuf::from("out.md")));
    }

    #[test]
    fn test_last_toggle_wins() {
        let cli = parse(&["-i", "a.docx", "--no-validate", "--validate"]);
        assert!(cli.to_config().validate_output);
    }

    #[test]
    fn test_multiple_inputs_enable_batch() {
        let cli = parse(&["-i", "a.docx", "--input", "b.pdf"]);
        assert_eq!(cli.inputs.len(), 2);
        assert!(cli.to_config().batch_mode);
    }

    #[test]
    fn test_input_required() {
        assert!(Cli::try_parse_from(["doc2md"]).is_err());
        assert!(Cli::try_parse_from(["doc2md", "--sample-config", "x.yaml"]).is_ok());
    }

    #[test]
    fn test_cli_overrides_file_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc2md.yaml");
        ConversionConfig::new()
            .with_heading_offset(3)
            .with_metadata(true)
            .save(&path)
            .unwrap();

        let cli = parse(&[
            "-i",
            "a.docx",
            "-c",
            path.to_str().unwrap(),
            "--heading-offset",
            "1",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.heading_offset, 1);
        assert!(config.include_metadata);
        assert_eq!(config.input_path, Some(PathBuf::from("a.docx")));
    }
}
