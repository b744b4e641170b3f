//! PDF parser using lopdf, with pdf-extract as a whole-document fallback.
//!
//! PDFs carry no semantic structure, so every page becomes a `Page N`
//! section and headings inside a page are guessed from line shape.

use super::text::{clean_inline, normalize_text};
use super::DocumentParser;
use crate::detect::{verify_signature, FileFormat};
use crate::error::{Error, Result};
use crate::model::{
    Block, DocumentMetadata, Heading, ImageReference, InternalDocument, Paragraph, Resource,
    Section,
};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use std::path::Path;

/// Lines at least this long are never taken for headings.
const MAX_HEADING_CHARS: usize = 80;

/// Level of headings detected inside a page.
const DETECTED_HEADING_LEVEL: u8 = 3;

/// Parser for PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_with_lopdf(&self, pdf: &LopdfDocument, doc: &mut InternalDocument) -> bool {
        let pages = pdf.get_pages();
        let mut found_text = false;

        for (&page_num, &page_id) in pages.iter() {
            let text = match pdf.extract_text(&[page_num]) {
                Ok(text) => text,
                Err(e) => {
                    log::debug!("Page {}: text extraction failed: {}", page_num, e);
                    String::new()
                }
            };
            let text = normalize_text(&text);
            found_text |= !text.trim().is_empty();

            let mut images = Vec::new();
            for (name, resource) in page_images(pdf, page_id) {
                let id = format!("page{}_{}", page_num, name);
                images.push(ImageReference::new(id.clone()).with_page(page_num));
                doc.add_resource(id, resource);
            }

            for section in page_sections(page_num, &text, images) {
                doc.add_section(section);
            }
        }
        found_text
    }
}

impl DocumentParser for PdfParser {
    fn name(&self) -> &str {
        "pdf"
    }

    fn formats(&self) -> &[FileFormat] {
        &[FileFormat::Pdf]
    }

    fn parse(&self, path: &Path) -> Result<InternalDocument> {
        verify_signature(path, FileFormat::Pdf)?;

        let mut doc = InternalDocument::new();
        let fallback_reason = match LopdfDocument::load(path) {
            Ok(pdf) => {
                if pdf.is_encrypted() {
                    return Err(Error::NotImplemented("encrypted PDF".into()));
                }
                doc.metadata = extract_metadata(&pdf);
                doc.metadata.page_count = Some(pdf.get_pages().len() as u32);
                if self.parse_with_lopdf(&pdf, &mut doc) {
                    None
                } else {
                    Some("no text found".to_string())
                }
            }
            Err(lopdf::Error::Decryption(_)) => {
                return Err(Error::NotImplemented("encrypted PDF".into()))
            }
            Err(e) => {
                doc.metadata = DocumentMetadata::for_format(FileFormat::Pdf.as_str());
                Some(e.to_string())
            }
        };

        if let Some(reason) = fallback_reason {
            log::debug!("Falling back to pdf-extract for {}: {}", path.display(), reason);
            match pdf_extract::extract_text(path) {
                Ok(text) => {
                    let images: Vec<Section> = doc
                        .sections
                        .drain(..)
                        .filter(|s| s.blocks.iter().any(|b| matches!(b, Block::Image(_))))
                        .collect();
                    let pages: Vec<&str> = text.split('\x0c').collect();
                    if doc.metadata.page_count.is_none() {
                        doc.metadata.page_count = Some(pages.len() as u32);
                    }
                    for (i, page) in pages.iter().enumerate() {
                        let text = normalize_text(page);
                        for section in page_sections(i as u32 + 1, &text, Vec::new()) {
                            doc.add_section(section);
                        }
                    }
                    doc.sections.extend(images);
                }
                Err(e) if doc.sections.is_empty() && doc.metadata.page_count.is_none() => {
                    return Err(e.into());
                }
                Err(e) => log::debug!("pdf-extract failed: {}", e),
            }
        }

        if doc.metadata.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            doc.metadata.title = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        }
        log::debug!(
            "Parsed PDF {}: {} sections, {} images",
            path.display(),
            doc.sections.len(),
            doc.resources.len()
        );
        Ok(doc)
    }
}

/// Read title, author and dates from the trailer's Info dictionary.
fn extract_metadata(pdf: &LopdfDocument) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::for_format(FileFormat::Pdf.as_str());

    let info = pdf
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| match obj {
            Object::Reference(id) => pdf.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        });

    if let Some(info) = info {
        metadata.title = dict_string(info, b"Title").map(|s| clean_inline(&s));
        metadata.author = dict_string(info, b"Author").map(|s| clean_inline(&s));
        metadata.created = dict_string(info, b"CreationDate").and_then(|s| parse_pdf_date(&s));
        metadata.modified = dict_string(info, b"ModDate").and_then(|s| parse_pdf_date(&s));
    }
    metadata
}

/// Decode a text string entry: UTF-16BE with BOM, else UTF-8, else Latin-1.
fn dict_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse a PDF date (`D:YYYYMMDDHHmmSS`, trailing fields optional).
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))?
        .and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

/// Image XObjects on a page whose stream is a complete image file
/// (JPEG or JPEG 2000). Raw sample data is skipped.
fn page_images(pdf: &LopdfDocument, page_id: ObjectId) -> Vec<(String, Resource)> {
    let resolve = |obj: &Object| -> Option<Dictionary> {
        match obj {
            Object::Reference(id) => pdf.get_dictionary(*id).ok().cloned(),
            Object::Dictionary(d) => Some(d.clone()),
            _ => None,
        }
    };

    let Some(xobjects) = pdf
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Resources").ok())
        .and_then(resolve)
        .and_then(|res| res.get(b"XObject").ok().and_then(resolve))
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, obj) in xobjects.iter() {
        let Ok(Object::Stream(stream)) = obj.as_reference().and_then(|id| pdf.get_object(id))
        else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name_str().ok())
            == Some("Image");
        if !is_image {
            continue;
        }
        let filter = stream
            .dict
            .get(b"Filter")
            .ok()
            .and_then(|f| match f {
                Object::Array(filters) => filters.last().and_then(|f| f.as_name_str().ok()),
                other => other.as_name_str().ok(),
            })
            .unwrap_or("");
        let mime = match filter {
            "DCTDecode" => "image/jpeg",
            "JPXDecode" => "image/jp2",
            other => {
                log::debug!("Skipping image XObject with filter {:?}", other);
                continue;
            }
        };
        let name = String::from_utf8_lossy(name).into_owned();
        images.push((name, Resource::image(stream.content.clone(), mime)));
    }
    images
}

/// Content detected on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageItem {
    Heading(String),
    Paragraph(String),
}

/// Build the sections for one page: a `Page N` section holding the text up
/// to the first detected heading, then one sub-section per heading. Images
/// are appended to the last section.
fn page_sections(page_num: u32, text: &str, images: Vec<ImageReference>) -> Vec<Section> {
    let items = detect_structure(text);
    if items.is_empty() && images.is_empty() {
        return Vec::new();
    }

    let mut sections = vec![Section::with_heading(Heading::new(
        2,
        format!("Page {}", page_num),
    ))];
    for item in items {
        match item {
            PageItem::Heading(text) => sections.push(Section::with_heading(Heading::new(
                DETECTED_HEADING_LEVEL,
                text,
            ))),
            PageItem::Paragraph(text) => {
                if let Some(current) = sections.last_mut() {
                    current.push(Paragraph::new(text));
                }
            }
        }
    }
    if let Some(current) = sections.last_mut() {
        for image in images {
            current.push(image);
        }
    }
    sections
}

fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_alphabetic)
        && line
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| !c.is_lowercase())
        && line.chars().any(char::is_uppercase)
}

fn is_short(line: &str) -> bool {
    line.chars().count() < MAX_HEADING_CHARS
}

fn ends_unpunctuated(line: &str) -> bool {
    line.chars()
        .last()
        .map_or(false, |c| !".!?,;:".contains(c))
}

/// Whether `lines[i]` reads as a heading: short and in capitals, or short,
/// unpunctuated and followed by a blank or capitalised line.
fn is_heading_line(lines: &[&str], i: usize) -> bool {
    let line = lines[i];
    let next_starts_block = lines.get(i + 1).map_or(false, |next| {
        next.is_empty() || next.chars().next().map_or(false, char::is_uppercase)
    });
    is_short(line)
        && line.chars().any(char::is_alphabetic)
        && (is_all_caps(line) || (ends_unpunctuated(line) && next_starts_block))
}

/// Split page text into headings and paragraphs.
///
/// A line is a heading when it is short and in capitals, or short,
/// unpunctuated and followed by a blank or capitalised line. Other lines
/// accumulate into a paragraph until a blank line or a heading candidate.
pub(crate) fn detect_structure(text: &str) -> Vec<PageItem> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut items = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            i += 1;
            continue;
        }

        if is_heading_line(&lines, i) {
            items.push(PageItem::Heading(clean_inline(line)));
            i += 1;
            continue;
        }

        let mut paragraph = vec![line];
        i += 1;
        while i < lines.len() {
            let next = lines[i];
            if next.is_empty() || is_heading_line(&lines, i) {
                break;
            }
            paragraph.push(next);
            i += 1;
        }
        items.push(PageItem::Paragraph(clean_inline(&paragraph.join(" "))));
    }
    items
}
