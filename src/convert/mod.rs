//! Conversion pipeline.
//!
//! An [`Orchestrator`] runs one file through
//! validate → select parser → parse → extract images → serialize →
//! pretty-print → validate output → write/preview/dry-run, collecting errors,
//! warnings and statistics into a [`ConversionResult`]. It never panics or
//! returns an error to its caller: every failure ends up on the result.
//!
//! # Example
//!
//! ```no_run
//! use doc2md::config::ConversionConfig;
//! use doc2md::convert::Orchestrator;
//! use doc2md::logger::Logger;
//!
//! let config = ConversionConfig::new()
//!     .with_input("report.docx")
//!     .with_output("report.md");
//! let result = Orchestrator::new(config, Logger::disabled()).convert();
//! for error in &result.errors {
//!     eprintln!("{}", error);
//! }
//! ```

mod batch;
mod result;

pub use result::{ConversionResult, ConversionStats, ConversionStatus};

use crate::config::ConversionConfig;
use crate::error::Error;
use crate::images::{ImageExtractor, OcrEngine};
use crate::logger::Logger;
use crate::model::InternalDocument;
use crate::output::{stdout_sink, DisplaySink, OutputWriter, PREVIEW_LINES};
use crate::parser::FormatRouter;
use crate::render::{serialize, PrettyOptions, PrettyPrinter};
use crate::validate::{FileValidator, MarkdownValidator, Severity};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Encoding used for console output.
const DISPLAY_ENCODING: &str = "utf-8";

/// Runs the conversion pipeline for one configuration.
pub struct Orchestrator {
    config: ConversionConfig,
    logger: Logger,
    router: Arc<FormatRouter>,
    display: DisplaySink,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Orchestrator {
    /// Create an orchestrator with the default parsers, writing console
    /// output to stdout.
    pub fn new(config: ConversionConfig, logger: Logger) -> Self {
        Self {
            config,
            logger,
            router: Arc::new(FormatRouter::with_defaults()),
            display: stdout_sink(),
            ocr: None,
        }
    }

    /// Use a custom parser router.
    pub fn with_router(mut self, router: Arc<FormatRouter>) -> Self {
        self.router = router;
        self
    }

    /// Send preview and stdout output to `display`.
    pub fn with_display(mut self, display: DisplaySink) -> Self {
        self.display = display;
        self
    }

    /// Run `engine` on extracted images when OCR is enabled.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert the configured input file.
    pub fn convert(&self) -> ConversionResult {
        let start = Instant::now();
        let input = self.config.input_path.clone().unwrap_or_default();
        let mut result = ConversionResult::new(input.clone(), self.config.output_path.clone());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(&input, &mut result)));
        if let Err(payload) = outcome {
            let message = format!(
                "Unexpected error during conversion: {}",
                panic_message(payload.as_ref())
            );
            self.logger.error(&message);
            result.errors.push(message);
            result.status = ConversionStatus::Failure;
        }

        result.duration = start.elapsed();
        if result.status == ConversionStatus::Success {
            self.logger
                .conversion_complete(&self.destination_label(), result.duration);
        }
        result
    }

    fn run(&self, input: &Path, result: &mut ConversionResult) {
        if input.as_os_str().is_empty() {
            self.fail(result, Error::Config("No input file specified".into()).to_string());
            return;
        }

        let size = input.metadata().map(|m| m.len()).unwrap_or(0);
        self.logger.conversion_start(input, size);

        // VALIDATE
        self.logger.debug("Validating input file");
        let validation = FileValidator::from_config(&self.config).validate(input);
        if !validation.valid {
            let message = validation
                .message
                .unwrap_or_else(|| "File validation failed".to_string());
            self.fail(result, message);
            return;
        }
        self.logger
            .info(format!("File validated successfully: {}", validation.format));

        // SELECT_PARSER
        let parser = match self.router.get_parser(validation.format) {
            Ok(parser) => parser,
            Err(e) => {
                self.fail(result, e.to_string());
                return;
            }
        };

        // PARSE
        self.logger.info(format!("Parsing document with {} parser", parser.name()));
        let parsed = panic::catch_unwind(AssertUnwindSafe(|| parser.parse(input)))
            .unwrap_or_else(|payload| {
                Err(Error::Parse(format!(
                    "parser panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
        let mut doc = match parsed {
            Ok(doc) => doc,
            Err(e) => {
                self.handle_parse_failure(result, e);
                return;
            }
        };
        self.logger.info("Document parsed successfully");
        self.record_document_stats(result, &doc);

        // EXTRACT_IMAGES
        let wants_files = self.config.extract_images && !self.config.embed_images_base64;
        if wants_files && doc.images().next().is_some() {
            self.extract_images(result, &mut doc, input);
        }

        // SERIALIZE
        self.logger.info("Serializing to Markdown");
        let markdown = match serialize(&doc, &self.config) {
            Ok(markdown) => markdown,
            Err(e) => {
                let message = match e {
                    Error::Serialize(_) => e.to_string(),
                    other => Error::Serialize(other.to_string()).to_string(),
                };
                self.fail(result, message);
                return;
            }
        };
        self.logger
            .debug(format!("Serialized {} characters", markdown.chars().count()));

        // PRETTY_PRINT
        let printer = PrettyPrinter::new(PrettyOptions::from_config(&self.config));
        let markdown = match panic::catch_unwind(AssertUnwindSafe(|| printer.format(&markdown))) {
            Ok(formatted) => formatted,
            Err(payload) => {
                self.warn(
                    result,
                    format!(
                        "Pretty printing failed, using unformatted output: {}",
                        panic_message(payload.as_ref())
                    ),
                );
                markdown
            }
        };

        // VALIDATE_OUTPUT
        if self.config.validate_output {
            self.validate_output(result, &markdown);
        }

        // WRITE / PREVIEW / DRY-RUN
        if let Err(e) = self.deliver(&markdown) {
            let message = match e {
                Error::Write(_) => e.to_string(),
                other => Error::Write(other.to_string()).to_string(),
            };
            result.markdown_content = Some(markdown);
            self.fail(result, message);
            return;
        }

        result.markdown_content = Some(markdown);
        result.status = ConversionStatus::Success;
    }

    fn handle_parse_failure(&self, result: &mut ConversionResult, err: Error) {
        if let Error::NotImplemented(_) = err {
            self.fail(result, err.to_string());
            result
                .warnings
                .push("Partial conversion may be available in future versions".to_string());
            return;
        }

        let message = match err {
            Error::Parse(_) => err.to_string(),
            other => Error::Parse(other.to_string()).to_string(),
        };
        self.fail(result, message.clone());

        if self.config.dry_run || self.config.preview_mode {
            self.warn(
                result,
                "Partial output may be incomplete due to parsing errors".to_string(),
            );
            let placeholder = format!("# Parsing Error\n\n{}\n", message);
            if self.config.preview_mode {
                if let Err(e) = self.deliver(&placeholder) {
                    self.logger.warning(format!("Preview failed: {}", e));
                }
            }
            result.markdown_content = Some(placeholder);
            result.status = ConversionStatus::PartialSuccess;
        }
    }

    fn record_document_stats(&self, result: &mut ConversionResult, doc: &InternalDocument) {
        let images = doc.images().count();
        result.stats.pages = doc.metadata.page_count.unwrap_or(0);
        result.stats.images_found = images;
        result.stats.tables_converted = doc.table_count();
        result.stats.headings_detected = doc.heading_count();
        self.logger.debug(format!(
            "Document has {} sections, {} tables, {} images",
            doc.sections.len(),
            result.stats.tables_converted,
            images
        ));
    }

    fn extract_images(
        &self,
        result: &mut ConversionResult,
        doc: &mut InternalDocument,
        input: &Path,
    ) {
        let mut extractor =
            ImageExtractor::for_config(&self.config).with_logger(self.logger.clone());
        if self.config.enable_ocr {
            if let Some(engine) = &self.ocr {
                extractor = extractor.with_ocr(Arc::clone(engine));
            }
        }

        self.logger
            .info(format!("Extracting {} images", result.stats.images_found));
        match extractor.extract_images(doc, input) {
            Ok(records) => {
                result.stats.images_extracted = records.iter().filter(|r| r.written).count();
                result.stats.ocr_applied = records.iter().filter(|r| r.ocr_text.is_some()).count();
                self.logger.info(format!("Extracted {} images", records.len()));
            }
            Err(e) => self.warn(result, format!("Image extraction failed: {}", e)),
        }
    }

    fn validate_output(&self, result: &mut ConversionResult, markdown: &str) {
        self.logger.debug("Validating Markdown output");
        let validation = MarkdownValidator::new().validate(markdown);

        for issue in &validation.issues {
            let message = match issue.severity {
                Severity::Error => format!("Validation error: {}", issue),
                other => format!(
                    "Validation {}: {}",
                    other.as_str().to_lowercase(),
                    issue
                ),
            };
            if issue.severity == Severity::Error {
                self.logger.warning(&message);
            } else {
                self.logger.debug(&message);
            }
            result.warnings.push(message);
        }

        if validation.valid {
            self.logger.info("Markdown validation passed");
        } else {
            self.logger.warning(format!(
                "Markdown validation found {} errors and {} warnings",
                validation.error_count, validation.warning_count
            ));
        }
    }

    /// Send `markdown` to exactly one destination.
    fn deliver(&self, markdown: &str) -> crate::Result<()> {
        if self.config.preview_mode {
            OutputWriter::new(DISPLAY_ENCODING, Arc::clone(&self.display))?
                .preview(markdown, PREVIEW_LINES)
        } else if self.config.dry_run {
            self.logger.info("Dry-run mode: skipping file write");
            Ok(())
        } else if let Some(path) = &self.config.output_path {
            OutputWriter::new(&self.config.output_encoding, Arc::clone(&self.display))?
                .write_file(path, markdown)?;
            self.logger.info(format!(
                "Output written to: {} (encoding: {})",
                path.display(),
                self.config.output_encoding
            ));
            Ok(())
        } else {
            OutputWriter::new(DISPLAY_ENCODING, Arc::clone(&self.display))?.write_stdout(markdown)
        }
    }

    fn destination_label(&self) -> String {
        if self.config.preview_mode {
            "preview".to_string()
        } else if self.config.dry_run {
            "dry-run".to_string()
        } else {
            self.config
                .output_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "stdout".to_string())
        }
    }

    fn fail(&self, result: &mut ConversionResult, message: String) {
        self.logger.error(&message);
        result.errors.push(message);
        result.status = ConversionStatus::Failure;
    }

    fn warn(&self, result: &mut ConversionResult, message: String) {
        self.logger.warning(&message);
        result.warnings.push(message);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::FileFormat;
    use crate::error::Result;
    use crate::model::{
        Heading, ImageReference, Paragraph, Resource, Section, Table, TextFormatting,
    };
    use crate::parser::DocumentParser;
    use std::fs;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn sink(&self) -> DisplaySink {
            Arc::new(Mutex::new(Box::new(self.clone())))
        }

        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    enum Behavior {
        Document,
        WithImage,
        LooseLink,
        Fail,
        NotImplemented,
        Panic,
    }

    struct StubParser(Behavior);

    impl DocumentParser for StubParser {
        fn name(&self) -> &str {
            "stub"
        }

        fn formats(&self) -> &[FileFormat] {
            &[FileFormat::Docx]
        }

        fn parse(&self, _path: &Path) -> Result<InternalDocument> {
            match self.0 {
                Behavior::Document => {
                    let mut doc = InternalDocument::new();
                    let mut section = Section::with_heading(Heading::new(1, "Title"));
                    section.push(Paragraph::new("Body"));
                    section.push(Table::new(
                        vec!["a".into(), "b".into(), "c".into()],
                        vec![vec!["1".into(), "2".into()]],
                    ));
                    doc.add_section(section);
                    Ok(doc)
                }
                Behavior::WithImage => {
                    let mut doc = InternalDocument::new();
                    let mut section = Section::new();
                    section.push(ImageReference::new("i1").with_alt_text("figure"));
                    doc.add_section(section);
                    doc.add_resource("i1", Resource::image(b"\x89PNG\r\n".to_vec(), "image/png"));
                    Ok(doc)
                }
                Behavior::LooseLink => {
                    let mut doc = InternalDocument::new();
                    let mut section = Section::new();
                    section.push(Paragraph::new("[](x)").with_formatting(TextFormatting::Code));
                    doc.add_section(section);
                    Ok(doc)
                }
                Behavior::Fail => Err(Error::Corrupted("bad zip".into())),
                Behavior::NotImplemented => Err(Error::NotImplemented("docx".into())),
                Behavior::Panic => panic!("boom"),
            }
        }
    }

    fn setup(behavior: Behavior) -> (TempDir, ConversionConfig, Arc<FormatRouter>) {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("doc.docx");
        fs::write(&input, b"PK\x03\x04stub").unwrap();
        let config = ConversionConfig::new()
            .with_input(&input)
            .with_output(dir.path().join("out/doc.md"));
        let mut router = FormatRouter::new();
        router.register(Arc::new(StubParser(behavior)));
        (dir, config, Arc::new(router))
    }

    fn run(config: ConversionConfig, router: Arc<FormatRouter>, capture: &Capture) -> ConversionResult {
        Orchestrator::new(config, Logger::disabled())
            .with_router(router)
            .with_display(capture.sink())
            .convert()
    }

    #[test]
    fn test_successful_conversion_writes_file() {
        let (dir, config, router) = setup(Behavior::Document);
        let result = run(config.with_heading_offset(1), router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Success, "{:?}", result.errors);
        let written = fs::read_to_string(dir.path().join("out/doc.md")).unwrap();
        assert!(written.contains("## Title"));
        assert!(written.contains("Body"));
        assert_eq!(result.markdown_content.as_deref(), Some(written.as_str()));
        assert_eq!(result.stats.tables_converted, 1);
        assert_eq!(result.stats.headings_detected, 1);
    }

    #[test]
    fn test_missing_input() {
        let capture = Capture::default();
        let config = ConversionConfig::new().with_input("missing.docx");
        let result = Orchestrator::new(config, Logger::disabled())
            .with_display(capture.sink())
            .convert();

        assert!(!result.is_success());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("not found"));
        assert!(result.errors[0].contains("missing.docx"));
    }

    #[test]
    fn test_parse_failure_is_terminal() {
        let (dir, config, router) = setup(Behavior::Fail);
        let result = run(config, router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.errors[0].starts_with("Failed to parse document:"));
        assert!(result.markdown_content.is_none());
        assert!(!dir.path().join("out/doc.md").exists());
    }

    #[test]
    fn test_parse_failure_degrades_in_dry_run() {
        let (dir, config, router) = setup(Behavior::Fail);
        let result = run(config.with_dry_run(true), router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::PartialSuccess);
        assert!(result.is_success());
        let content = result.markdown_content.unwrap();
        assert!(content.starts_with("# Parsing Error\n\n"));
        assert!(result
            .warnings
            .contains(&"Partial output may be incomplete due to parsing errors".to_string()));
        assert!(!dir.path().join("out/doc.md").exists());
    }

    #[test]
    fn test_not_implemented_reported_distinctly() {
        let (_dir, config, router) = setup(Behavior::NotImplemented);
        let result = run(config.with_dry_run(true), router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.errors[0].starts_with("Parser not yet implemented"));
        assert!(result
            .warnings
            .contains(&"Partial conversion may be available in future versions".to_string()));
    }

    #[test]
    fn test_parser_panic_is_caught() {
        let (_dir, config, router) = setup(Behavior::Panic);
        let result = run(config, router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.errors[0].contains("boom"));
    }

    #[test]
    fn test_preview_does_not_touch_output() {
        let (dir, config, router) = setup(Behavior::Document);
        let output = dir.path().join("out/doc.md");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "original").unwrap();

        let capture = Capture::default();
        let result = run(config.with_preview(true), router, &capture);

        assert!(result.is_success());
        assert_eq!(fs::read_to_string(&output).unwrap(), "original");
        assert!(capture.text().contains("PREVIEW (showing first 50 lines)"));
        assert!(capture.text().contains("# Title"));
    }

    #[test]
    fn test_stdout_when_no_output_path() {
        let (_dir, mut config, router) = setup(Behavior::Document);
        config.output_path = None;
        let capture = Capture::default();
        let result = run(config, router, &capture);

        assert!(result.is_success());
        assert_eq!(Some(capture.text()), result.markdown_content);
    }

    #[test]
    fn test_bad_encoding_is_write_failure() {
        let (_dir, config, router) = setup(Behavior::Document);
        let result = run(config.with_encoding("klingon"), router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Failure);
        assert!(result.errors[0].starts_with("Failed to write output:"));
        assert!(result.markdown_content.is_some());
    }

    #[test]
    fn test_unknown_format_has_no_parser() {
        let (dir, config, _) = setup(Behavior::Document);
        let input = dir.path().join("sheet.xlsx");
        fs::write(&input, b"PK\x03\x04").unwrap();
        let mut router = FormatRouter::new();
        router.register(Arc::new(StubParser(Behavior::Document)));

        let result = run(config.with_input(&input), Arc::new(router), &Capture::default());
        assert!(result.errors[0].starts_with("No parser available for format"));
    }

    #[test]
    fn test_image_extraction_failure_is_warning() {
        let (dir, config, router) = setup(Behavior::WithImage);
        fs::create_dir_all(dir.path().join("out")).unwrap();
        // A plain file where the per-document image directory should go.
        fs::write(dir.path().join("out/doc"), b"in the way").unwrap();

        let result = run(config, router, &Capture::default());

        assert_eq!(result.status, ConversionStatus::Success, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.starts_with("Image extraction failed:")),
            "{:?}",
            result.warnings
        );
        assert_eq!(result.stats.images_extracted, 0);
        let written = fs::read_to_string(dir.path().join("out/doc.md")).unwrap();
        assert!(written.contains("<!-- Image extraction failed: figure -->"), "{}", written);
    }

    #[test]
    fn test_validator_issues_become_warnings() {
        let (_dir, config, router) = setup(Behavior::LooseLink);
        let result = run(config, router, &Capture::default());

        assert!(result.is_success(), "{:?}", result.errors);
        assert!(result.errors.is_empty());
        let found: Vec<&String> = result
            .warnings
            .iter()
            .filter(|w| w.starts_with("Validation warning:"))
            .collect();
        assert_eq!(found.len(), 1, "{:?}", result.warnings);
        assert!(found[0].contains("Link has empty text"));
        assert!(result.markdown_content.unwrap().contains("`[](x)`"));
    }
}
