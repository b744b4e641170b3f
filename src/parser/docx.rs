//! Word (.docx) parser.
//!
//! Reads the WordprocessingML package with `zip` and walks
//! `word/document.xml` with `quick-xml`. Heading styles start new sections,
//! numbered paragraphs become list items, and embedded pictures become image
//! references whose payloads are kept in the document's resources.

use super::text::{clean_inline, normalize_text};
use super::DocumentParser;
use crate::detect::{verify_signature, FileFormat};
use crate::error::{Error, Result};
use crate::model::{
    Block, DocumentMetadata, Heading, ImageReference, InternalDocument, Link, ListItem, Paragraph,
    Resource, Section, Table, TextFormatting,
};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Parser for Word documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a package from any seekable reader.
    pub fn parse_reader<R: Read + Seek>(&self, reader: R) -> Result<InternalDocument> {
        let mut archive = ZipArchive::new(reader)?;

        let xml = read_part(&mut archive, DOCUMENT_PART)?
            .ok_or_else(|| Error::Corrupted(format!("missing {}", DOCUMENT_PART)))?;

        let context = PackageContext {
            relationships: read_part(&mut archive, "word/_rels/document.xml.rels")?
                .map(|x| parse_relationships(&x))
                .transpose()?
                .unwrap_or_default(),
            numbering: read_part(&mut archive, "word/numbering.xml")?
                .map(|x| parse_numbering(&x))
                .transpose()?
                .unwrap_or_default(),
            styles: read_part(&mut archive, "word/styles.xml")?
                .map(|x| parse_styles(&x))
                .transpose()?
                .unwrap_or_default(),
        };

        let body = parse_body(&xml, &context)?;

        let mut doc = InternalDocument::new();
        doc.metadata = match read_part(&mut archive, "docProps/core.xml")? {
            Some(core) => parse_core_properties(&core)?,
            None => DocumentMetadata::for_format(FileFormat::Docx.as_str()),
        };
        doc.sections = body.sections;

        for id in body.image_ids {
            if doc.resources.contains_key(&id) {
                continue;
            }
            let Some(rel) = context.relationships.get(&id) else {
                continue;
            };
            if rel.external {
                continue;
            }
            let part = resolve_target(&rel.target);
            if let Some(data) = read_binary_part(&mut archive, &part)? {
                doc.add_resource(id, Resource::detect(data, &part));
            }
        }

        Ok(doc)
    }
}

impl DocumentParser for DocxParser {
    fn name(&self) -> &str {
        "docx"
    }

    fn formats(&self) -> &[FileFormat] {
        &[FileFormat::Docx]
    }

    fn parse(&self, path: &Path) -> Result<InternalDocument> {
        verify_signature(path, FileFormat::Docx)?;
        let file = File::open(path)?;
        let mut doc = self.parse_reader(BufReader::new(file))?;

        if doc.metadata.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            doc.metadata.title = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        }
        log::debug!(
            "Parsed DOCX {}: {} sections, {} images",
            path.display(),
            doc.sections.len(),
            doc.resources.len()
        );
        Ok(doc)
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut text = String::new();
            file.read_to_string(&mut text)?;
            Ok(Some(text))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_binary_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Package part name for a relationship target relative to `word/`.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut parts: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    target: String,
    external: bool,
}

#[derive(Debug, Default)]
struct PackageContext {
    relationships: HashMap<String, Relationship>,
    /// (numId, level) -> ordered
    numbering: HashMap<(String, u8), bool>,
    /// styleId -> style name
    styles: HashMap<String, String>,
}

impl PackageContext {
    fn heading_level(&self, style_id: &str) -> Option<u8> {
        let name = self.styles.get(style_id).map(String::as_str);
        heading_level_for(style_id).or_else(|| name.and_then(heading_level_for))
    }

    fn style_list(&self, style_id: &str) -> Option<ListItem> {
        let name = self.styles.get(style_id).map(String::as_str).unwrap_or(style_id);
        list_for_style(name).or_else(|| list_for_style(style_id))
    }

    fn is_ordered(&self, num_id: &str, level: u8) -> bool {
        self.numbering
            .get(&(num_id.to_string(), level))
            .copied()
            .unwrap_or(false)
    }
}

/// Heading level for a style id or name such as `Heading2`, `heading 2`
/// or `Title`. Levels beyond 6 are clamped.
fn heading_level_for(style: &str) -> Option<u8> {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if compact == "title" {
        return Some(1);
    }
    let digits = compact.strip_prefix("heading")?;
    let level: i64 = digits.parse().ok()?;
    Some(Heading::clamped(level, "").level)
}

/// List membership implied by built-in list styles (`List Bullet 2`,
/// `List Number`).
fn list_for_style(style: &str) -> Option<ListItem> {
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let (ordered, rest) = if let Some(rest) = compact.strip_prefix("listbullet") {
        (false, rest)
    } else if let Some(rest) = compact.strip_prefix("listnumber") {
        (true, rest)
    } else {
        return None;
    };
    let level = rest.parse::<u8>().map_or(0, |n| n.saturating_sub(1));
    Some(if ordered {
        ListItem::ordered(level)
    } else {
        ListItem::bullet(level)
    })
}

/// Attribute value by qualified name, falling back to the local name.
fn attr(e: &BytesStart, key: &str) -> Option<String> {
    let local = key.rsplit(':').next().unwrap_or(key);
    let mut fallback = None;
    for a in e.attributes().flatten() {
        let Ok(value) = a.unescape_value() else {
            continue;
        };
        if a.key.as_ref() == key.as_bytes() {
            return Some(value.into_owned());
        }
        if fallback.is_none() && a.key.local_name().as_ref() == local.as_bytes() {
            fallback = Some(value.into_owned());
        }
    }
    fallback
}

/// Local name of a WordprocessingML element (`w:` prefix or unprefixed).
fn w_name<'a>(name: &'a [u8]) -> Option<&'a [u8]> {
    match name.strip_prefix(b"w:") {
        Some(local) => Some(local),
        None if !name.contains(&b':') => Some(name),
        None => None,
    }
}

/// Toggle properties such as `<w:b/>` are on unless `w:val` says otherwise.
fn toggle_on(e: &BytesStart) -> bool {
    !matches!(
        attr(e, "w:val").as_deref(),
        Some("0") | Some("false") | Some("off") | Some("none")
    )
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, "Id"), attr(&e, "Target")) {
                    let external = attr(&e, "TargetMode").as_deref() == Some("External");
                    rels.insert(id, Relationship { target, external });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rels)
}

fn parse_numbering(xml: &str) -> Result<HashMap<(String, u8), bool>> {
    let mut reader = Reader::from_str(xml);
    // abstractNumId -> level -> ordered
    let mut abstract_levels: HashMap<String, HashMap<u8, bool>> = HashMap::new();
    // numId -> abstractNumId
    let mut nums: HashMap<String, String> = HashMap::new();

    let mut current_abstract: Option<String> = None;
    let mut current_level: Option<u8> = None;
    let mut current_num: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match w_name(e.name().as_ref()) {
                Some(b"abstractNum") => current_abstract = attr(&e, "w:abstractNumId"),
                Some(b"lvl") => current_level = attr(&e, "w:ilvl").and_then(|v| v.parse().ok()),
                Some(b"numFmt") => {
                    if let (Some(abs), Some(level)) = (&current_abstract, current_level) {
                        let format = attr(&e, "w:val").unwrap_or_default();
                        let ordered = !matches!(format.as_str(), "bullet" | "none" | "");
                        abstract_levels
                            .entry(abs.clone())
                            .or_default()
                            .insert(level, ordered);
                    }
                }
                Some(b"num") => current_num = attr(&e, "w:numId"),
                Some(b"abstractNumId") => {
                    if let (Some(num), Some(abs)) = (&current_num, attr(&e, "w:val")) {
                        nums.insert(num.clone(), abs);
                    }
                }
                _ => {}
            },
            Event::End(e) => match w_name(e.name().as_ref()) {
                Some(b"abstractNum") => current_abstract = None,
                Some(b"lvl") => current_level = None,
                Some(b"num") => current_num = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let mut map = HashMap::new();
    for (num, abs) in nums {
        if let Some(levels) = abstract_levels.get(&abs) {
            for (&level, &ordered) in levels {
                map.insert((num.clone(), level), ordered);
            }
        }
    }
    Ok(map)
}

fn parse_styles(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut styles = HashMap::new();
    let mut current: Option<String> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match w_name(e.name().as_ref()) {
                Some(b"style") => current = attr(&e, "w:styleId"),
                Some(b"name") => {
                    if let (Some(id), Some(name)) = (&current, attr(&e, "w:val")) {
                        styles.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Event::End(e) if w_name(e.name().as_ref()) == Some(b"style") => current = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(styles)
}

fn parse_core_properties(xml: &str) -> Result<DocumentMetadata> {
    let mut reader = Reader::from_str(xml);
    let mut metadata = DocumentMetadata::for_format(FileFormat::Docx.as_str());
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => field = Some(e.local_name().as_ref().to_vec()),
            Event::End(_) => field = None,
            Event::Text(t) => {
                let value = t.unescape()?.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match field.as_deref() {
                    Some(b"title") => metadata.title = Some(clean_inline(&value)),
                    Some(b"creator") => metadata.author = Some(clean_inline(&value)),
                    Some(b"created") => metadata.created = parse_w3c_date(&value),
                    Some(b"modified") => metadata.modified = parse_w3c_date(&value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(metadata)
}

fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Paragraph under construction.
#[derive(Debug, Default)]
struct ParagraphState {
    style: Option<String>,
    num_id: Option<String>,
    num_level: u8,
    text: String,
    text_runs: usize,
    bold_runs: usize,
    italic_runs: usize,
    hyperlink: Option<String>,
    hyperlink_count: usize,
    link_text: String,
    images: Vec<ImageReference>,
}

#[derive(Debug, Default)]
struct RunState {
    bold: bool,
    italic: bool,
    text: String,
}

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
}

impl TableState {
    fn append_to_cell(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            if !cell.is_empty() && !text.is_empty() {
                cell.push('\n');
            }
            cell.push_str(text);
        }
    }
}

#[derive(Debug, Default)]
struct ParsedBody {
    sections: Vec<Section>,
    image_ids: Vec<String>,
}

/// Walks `w:body`, building sections.
struct BodyBuilder<'a> {
    context: &'a PackageContext,
    sections: Vec<Section>,
    current: Section,
    paragraphs: Vec<ParagraphState>,
    run: Option<RunState>,
    tables: Vec<TableState>,
    /// Images found inside tables, emitted after the outermost table
    table_images: Vec<ImageReference>,
    image_ids: Vec<String>,
    in_text: bool,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_hyperlink: bool,
    pending_alt: Option<String>,
    skip_depth: usize,
}

fn parse_body(xml: &str, context: &PackageContext) -> Result<ParsedBody> {
    let mut builder = BodyBuilder {
        context,
        sections: Vec::new(),
        current: Section::new(),
        paragraphs: Vec::new(),
        run: None,
        tables: Vec::new(),
        table_images: Vec::new(),
        image_ids: Vec::new(),
        in_text: false,
        in_paragraph_props: false,
        in_run_props: false,
        in_hyperlink: false,
        pending_alt: None,
        skip_depth: 0,
    };

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.start(&e, false),
            Event::Empty(e) => builder.start(&e, true),
            Event::End(e) => builder.end(e.name().as_ref()),
            Event::Text(t) => {
                if builder.in_text && builder.skip_depth == 0 {
                    let text = t.unescape()?;
                    builder.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

impl<'a> BodyBuilder<'a> {
    fn start(&mut self, e: &BytesStart, empty: bool) {
        let qname = e.name();
        let name = qname.as_ref();

        // mc:Fallback repeats the content of mc:Choice.
        if e.local_name().as_ref() == b"Fallback" || self.skip_depth > 0 {
            if !empty {
                self.skip_depth += 1;
            }
            return;
        }

        match e.local_name().as_ref() {
            b"docPr" => {
                self.pending_alt = attr(e, "descr")
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| attr(e, "title"));
                return;
            }
            b"blip" => {
                if let Some(id) = attr(e, "r:embed") {
                    self.add_image(id);
                }
                return;
            }
            b"imagedata" => {
                if let Some(id) = attr(e, "r:id") {
                    self.add_image(id);
                }
                return;
            }
            _ => {}
        }

        let Some(local) = w_name(name) else {
            return;
        };

        match local {
            b"p" if !empty => self.paragraphs.push(ParagraphState::default()),
            b"pPr" if !empty => self.in_paragraph_props = true,
            b"pStyle" if self.in_paragraph_props => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.style = attr(e, "w:val");
                }
            }
            b"numId" if self.in_paragraph_props => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.num_id = attr(e, "w:val").filter(|v| v != "0");
                }
            }
            b"ilvl" if self.in_paragraph_props => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.num_level = attr(e, "w:val").and_then(|v| v.parse().ok()).unwrap_or(0);
                }
            }
            b"r" if !empty => self.run = Some(RunState::default()),
            b"rPr" if !empty && !self.in_paragraph_props => self.in_run_props = true,
            b"b" if self.in_run_props => {
                if let Some(run) = self.run.as_mut() {
                    run.bold = toggle_on(e);
                }
            }
            b"i" if self.in_run_props => {
                if let Some(run) = self.run.as_mut() {
                    run.italic = toggle_on(e);
                }
            }
            b"t" if !empty => self.in_text = true,
            b"tab" if !self.in_paragraph_props => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            b"hyperlink" if !empty => {
                self.in_hyperlink = true;
                if let Some(p) = self.paragraphs.last_mut() {
                    p.hyperlink_count += 1;
                    p.hyperlink = attr(e, "r:id");
                }
            }
            b"tbl" if !empty => self.tables.push(TableState::default()),
            b"tr" if !empty => {
                if let Some(t) = self.tables.last_mut() {
                    t.row = Some(Vec::new());
                }
            }
            b"tc" if !empty => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell = Some(String::new());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        let Some(local) = w_name(name) else {
            return;
        };

        match local {
            b"t" => self.in_text = false,
            b"pPr" => self.in_paragraph_props = false,
            b"rPr" => self.in_run_props = false,
            b"r" => self.finish_run(),
            b"hyperlink" => self.in_hyperlink = false,
            b"p" => {
                if let Some(p) = self.paragraphs.pop() {
                    self.finish_paragraph(p);
                }
            }
            b"tc" => {
                if let Some(t) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (t.cell.take(), t.row.as_mut()) {
                        row.push(cell);
                    }
                }
            }
            b"tr" => {
                if let Some(t) = self.tables.last_mut() {
                    if let Some(row) = t.row.take() {
                        t.rows.push(row);
                    }
                }
            }
            b"tbl" => {
                if let Some(t) = self.tables.pop() {
                    self.finish_table(t);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        } else if let Some(p) = self.paragraphs.last_mut() {
            p.text.push_str(text);
        }
    }

    fn finish_run(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let Some(p) = self.paragraphs.last_mut() else {
            return;
        };
        if run.text.is_empty() {
            return;
        }
        p.text.push_str(&run.text);
        if self.in_hyperlink {
            p.link_text.push_str(&run.text);
        }
        if !run.text.trim().is_empty() {
            p.text_runs += 1;
            p.bold_runs += usize::from(run.bold);
            p.italic_runs += usize::from(run.italic);
        }
    }

    fn add_image(&mut self, id: String) {
        let mut image = ImageReference::new(id.clone());
        if let Some(alt) = self.pending_alt.take() {
            image = image.with_alt_text(clean_inline(&alt));
        }
        self.image_ids.push(id);
        match self.paragraphs.last_mut() {
            Some(p) => p.images.push(image),
            None => self.push_block(image.into()),
        }
    }

    fn finish_paragraph(&mut self, p: ParagraphState) {
        let text = normalize_text(&p.text);
        let text = text.trim();

        if let Some(table) = self.tables.last_mut() {
            table.append_to_cell(text);
            self.table_images.extend(p.images);
            return;
        }

        let style = p.style.as_deref().unwrap_or("");
        let heading = (!style.is_empty())
            .then(|| self.context.heading_level(style))
            .flatten();

        if let Some(level) = heading.filter(|_| !text.is_empty()) {
            self.start_section(Heading::new(level, clean_inline(text)));
        } else if !text.is_empty() {
            let block = self.paragraph_block(&p, style, text);
            self.push_block(block);
        }

        for image in p.images {
            self.push_block(image.into());
        }
    }

    fn paragraph_block(&self, p: &ParagraphState, style: &str, text: &str) -> Block {
        if p.hyperlink_count == 1 && p.link_text.trim() == text {
            if let Some(rel) = p
                .hyperlink
                .as_ref()
                .and_then(|id| self.context.relationships.get(id))
                .filter(|rel| rel.external)
            {
                return Link::new(text, rel.target.clone()).into();
            }
        }

        let formatting = if p.text_runs == 0 {
            TextFormatting::Normal
        } else {
            TextFormatting::from_flags(p.bold_runs == p.text_runs, p.italic_runs == p.text_runs)
        };

        let list = match &p.num_id {
            Some(num_id) => {
                let level = p.num_level.min(8);
                Some(if self.context.is_ordered(num_id, level) {
                    ListItem::ordered(level)
                } else {
                    ListItem::bullet(level)
                })
            }
            None if !style.is_empty() => self.context.style_list(style),
            None => None,
        };

        let mut paragraph = Paragraph::new(text).with_formatting(formatting);
        if let Some(list) = list {
            paragraph = paragraph.with_list(list);
        }
        paragraph.into()
    }

    fn finish_table(&mut self, table: TableState) {
        if let Some(outer) = self.tables.last_mut() {
            let flattened = table
                .rows
                .iter()
                .map(|r| r.join(" "))
                .collect::<Vec<_>>()
                .join("\n");
            outer.append_to_cell(&flattened);
            return;
        }

        let has_content = table
            .rows
            .iter()
            .any(|r| r.iter().any(|c| !c.trim().is_empty()));
        if has_content {
            self.push_block(Table::from_rows(table.rows).into());
        }
        let images = std::mem::take(&mut self.table_images);
        for image in images {
            self.push_block(image.into());
        }
    }

    fn start_section(&mut self, heading: Heading) {
        let previous = std::mem::replace(&mut self.current, Section::with_heading(heading));
        if !previous.is_empty() {
            self.sections.push(previous);
        }
    }

    fn push_block(&mut self, block: Block) {
        self.current.blocks.push(block);
    }

    fn finish(mut self) -> ParsedBody {
        if !self.current.is_empty() {
            self.sections.push(std::mem::take(&mut self.current));
        }
        ParsedBody {
            sections: self.sections,
            image_ids: self.image_ids,
        }
    }
}
