//! Image extraction and optional OCR.
//!
//! Image payloads collected by the parsers are written to
//! `<output_dir>/<source stem>/images/image_NNN.<ext>` and every image
//! reference in the document is pointed at that relative path. Without file
//! writing (dry-run or preview) the same paths are assigned, so the rendered
//! Markdown does not depend on the output mode.

use crate::config::ConversionConfig;
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::model::InternalDocument;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Text recognition backend.
pub trait OcrEngine: Send + Sync {
    /// Name of the engine, for logging.
    fn name(&self) -> &str;

    /// Recognize text in an encoded image.
    fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}

/// Record of one extracted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Image reference id
    pub id: String,
    /// Target file on disk
    pub path: PathBuf,
    /// Path written into the Markdown, relative to the output directory
    pub relative_path: String,
    pub size: usize,
    /// Whether the file was actually written
    pub written: bool,
    pub ocr_text: Option<String>,
}

/// Writes image payloads next to the Markdown output.
pub struct ImageExtractor {
    output_dir: PathBuf,
    write_files: bool,
    ocr: Option<Arc<dyn OcrEngine>>,
    ocr_language: String,
    logger: Logger,
}

impl ImageExtractor {
    /// Create an extractor writing under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_files: true,
            ocr: None,
            ocr_language: ConversionConfig::default().ocr_language,
            logger: Logger::disabled(),
        }
    }

    /// Create an extractor for a conversion. Files are not written in
    /// dry-run or preview mode.
    pub fn for_config(config: &ConversionConfig) -> Self {
        let mut extractor = Self::new(Self::output_dir_for(config));
        extractor.write_files = !(config.dry_run || config.preview_mode);
        extractor.ocr_language = config.ocr_language.clone();
        extractor
    }

    /// Directory images are written under: the output file's directory, or
    /// `./output` when writing to stdout.
    pub fn output_dir_for(config: &ConversionConfig) -> PathBuf {
        match config.output_path.as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => PathBuf::from("output"),
        }
    }

    /// Attach an OCR engine.
    pub fn with_ocr(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Enable or disable writing files.
    pub fn with_write_files(mut self, write: bool) -> Self {
        self.write_files = write;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Extract every image referenced by `doc`, updating the references in
    /// place with their relative paths (and OCR text, if an engine is set).
    pub fn extract_images(
        &self,
        doc: &mut InternalDocument,
        source: &Path,
    ) -> Result<Vec<ExtractedImage>> {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let images_dir = self.output_dir.join(&stem).join("images");

        let mut records = Vec::new();
        let mut index = 0;
        let InternalDocument {
            sections,
            resources,
            ..
        } = doc;

        let references = sections
            .iter_mut()
            .flat_map(|s| s.blocks.iter_mut())
            .filter_map(|b| match b {
                crate::model::Block::Image(img) => Some(img),
                _ => None,
            });

        for image in references {
            let Some(resource) = resources.get(&image.id) else {
                self.logger
                    .debug(format!("No payload for image {}, skipping", image.id));
                continue;
            };

            index += 1;
            let filename = format!("image_{:03}.{}", index, resource.extension());
            let path = images_dir.join(&filename);
            let relative_path = format!("{}/images/{}", stem, filename);

            if self.write_files {
                fs::create_dir_all(&images_dir).map_err(|e| {
                    Error::Write(format!("{}: {}", images_dir.display(), e))
                })?;
                fs::write(&path, &resource.data)
                    .map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))?;
            }

            let ocr_text = self.run_ocr(&image.id, &resource.data);

            image.extracted_path = Some(relative_path.clone());
            if ocr_text.is_some() {
                image.ocr_text = ocr_text.clone();
            }

            records.push(ExtractedImage {
                id: image.id.clone(),
                path,
                relative_path,
                size: resource.size(),
                written: self.write_files,
                ocr_text,
            });
        }

        Ok(records)
    }

    fn run_ocr(&self, id: &str, data: &[u8]) -> Option<String> {
        let engine = self.ocr.as_ref()?;
        match engine.recognize(data, &self.ocr_language) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                self.logger
                    .warning(format!("OCR ({}) failed for image {}: {}", engine.name(), id, e));
                None
            }
        }
    }
}
