//! Markdown serialization of the internal document model.

use crate::config::{ConversionConfig, TableStyle};
use crate::error::{Error, Result};
use crate::model::{
    Block, CodeBlock, Heading, ImageReference, InternalDocument, Link, ListKind, Paragraph,
    Section, Table, TextFormatting,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use super::escape::{
    code_fence, code_span, escape_link_text, escape_table_cell, escape_text, escape_url,
};
use super::{Emitted, RenderOptions, RenderResult, RenderStats};

/// Convert a document to Markdown.
pub fn to_markdown(doc: &InternalDocument, options: &RenderOptions) -> Result<String> {
    MarkdownSerializer::new(options.clone()).render(doc)
}

/// Convert a document to Markdown with statistics.
pub fn to_markdown_with_stats(doc: &InternalDocument, options: &RenderOptions) -> Result<RenderResult> {
    MarkdownSerializer::new(options.clone()).render_with_stats(doc)
}

/// Convert a document to Markdown using the rendering fields of `config`.
pub fn serialize(doc: &InternalDocument, config: &ConversionConfig) -> Result<String> {
    to_markdown(doc, &RenderOptions::from_config(config))
}

/// Markdown serializer.
///
/// Blocks are separated by a blank line, except consecutive list items
/// which stay on adjacent lines. Output ends with a single newline.
pub struct MarkdownSerializer {
    options: RenderOptions,
    stats: RenderStats,
    body: String,
    last_was_list: bool,
    /// Marker kind, marker width and item count for each open list level
    list_state: Vec<(ListKind, usize, u32)>,
}

impl MarkdownSerializer {
    /// Create a new serializer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            stats: RenderStats::default(),
            body: String::new(),
            last_was_list: false,
            list_state: Vec::new(),
        }
    }

    /// Render a document to Markdown.
    pub fn render(self, doc: &InternalDocument) -> Result<String> {
        Ok(self.render_with_stats(doc)?.content)
    }

    /// Render a document to Markdown with statistics.
    pub fn render_with_stats(mut self, doc: &InternalDocument) -> Result<RenderResult> {
        for section in &doc.sections {
            self.render_section(doc, section)?;
        }

        let mut output = String::new();
        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
            if !self.body.is_empty() {
                output.push('\n');
            }
        }
        output.push_str(self.body.trim_end());
        if !self.body.trim_end().is_empty() {
            output.push('\n');
        }

        Ok(RenderResult::new(output, self.stats))
    }

    fn render_section(&mut self, doc: &InternalDocument, section: &Section) -> Result<()> {
        self.end_list();

        if let Some(ref heading) = section.heading {
            self.render_heading(heading)?;
        }
        for block in &section.blocks {
            self.render_block(doc, block)?;
        }
        Ok(())
    }

    fn render_heading(&mut self, heading: &Heading) -> Result<()> {
        if !heading.is_valid() {
            return Err(Error::Serialize(format!(
                "heading level {} is outside 1-6: {:?}",
                heading.level, heading.text
            )));
        }
        let level = heading.rendered_level(self.options.heading_offset);
        let text = escape_text(heading.text.trim());
        let line = format!("{} {}", "#".repeat(level as usize), text)
            .trim_end()
            .to_string();
        self.stats.record(Emitted::Heading);
        self.push_block(&line);
        Ok(())
    }

    fn render_block(&mut self, doc: &InternalDocument, block: &Block) -> Result<()> {
        match block {
            Block::Paragraph(p) => self.render_paragraph(p),
            Block::Table(t) => self.render_table(t),
            Block::Image(img) => self.render_image(doc, img),
            Block::CodeBlock(code) => self.render_code_block(code),
            Block::Link(link) => self.render_link(link),
        }
        Ok(())
    }

    fn render_paragraph(&mut self, para: &Paragraph) {
        if para.is_empty() {
            return;
        }

        if let Some(list) = para.list {
            self.stats.record(Emitted::ListItem);
            let text = para
                .text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let content = format_inline(&text, para.formatting);
            let (indent, marker) = self.next_list_marker(list.kind, list.level as usize);
            let line = format!("{}{} {}", " ".repeat(indent), marker, content);
            self.push_list_item(&line);
            return;
        }

        if para.formatting == TextFormatting::Code && para.text.contains('\n') {
            self.render_code_block(&CodeBlock::new(para.text.clone()));
            return;
        }

        self.stats.record(Emitted::Paragraph);
        let text = para
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| format_inline(l, para.formatting))
            .collect::<Vec<_>>()
            .join("\n");
        self.push_block(&text);
    }

    /// Indentation and marker for the next item at `level`, updating the
    /// per-level counters.
    fn next_list_marker(&mut self, kind: ListKind, level: usize) -> (usize, String) {
        self.list_state.truncate(level + 1);
        while self.list_state.len() <= level {
            self.list_state.push((kind, 0, 0));
        }
        if self.list_state[level].0 != kind {
            self.list_state[level] = (kind, 0, 0);
        }

        let count = self.list_state[level].2 + 1;
        let marker = match kind {
            ListKind::Bullet => "-".to_string(),
            ListKind::Ordered => format!("{}.", count),
        };
        self.list_state[level].1 = marker.len();
        self.list_state[level].2 = count;

        // Nested content starts where the parent's text starts.
        let indent = self.list_state[..level]
            .iter()
            .map(|(_, width, _)| width.max(&1) + 1)
            .sum();
        (indent, marker)
    }

    fn render_table(&mut self, table: &Table) {
        let (headers, rows) = normalize_table(table);
        if headers.is_empty() {
            return;
        }
        self.stats.record(Emitted::Table);

        let width = headers.len();
        let headers: Vec<String> = headers.iter().map(|c| escape_table_cell(c)).collect();
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).map(|c| escape_table_cell(c)).unwrap_or_default())
                    .collect()
            })
            .collect();

        let lines = match self.options.table_style {
            TableStyle::Standard => standard_table(&headers, &rows),
            TableStyle::Compact => compact_table(&headers, &rows),
            TableStyle::Grid => grid_table(&headers, &rows),
        };
        self.push_block(&lines.join("\n"));
    }

    fn render_image(&mut self, doc: &InternalDocument, image: &ImageReference) {
        self.stats.record(Emitted::Image);
        let alt = escape_link_text(image.alt());

        let embedded = if self.options.embed_images {
            doc.get_resource(&image.id).map(|res| {
                format!(
                    "![{}](data:{};base64,{})",
                    alt,
                    res.mime_type,
                    BASE64.encode(&res.data)
                )
            })
        } else {
            None
        };

        let mut text = match (embedded, image.extracted_path.as_deref()) {
            (Some(embedded), _) => embedded,
            (None, Some(path)) if !path.trim().is_empty() => {
                format!("![{}]({})", alt, escape_url(path))
            }
            // No payload on disk to point at.
            _ => format!(
                "<!-- Image extraction failed: {} -->",
                image.alt().replace("--", "- -")
            ),
        };

        if let Some(ocr) = image.ocr_text.as_deref().map(str::trim) {
            if !ocr.is_empty() {
                let ocr = ocr.split_whitespace().collect::<Vec<_>>().join(" ");
                text.push_str(&format!("\n\n*OCR extracted text: {}*", escape_text(&ocr)));
            }
        }
        self.push_block(&text);
    }

    fn render_code_block(&mut self, code: &CodeBlock) {
        self.stats.record(Emitted::CodeBlock);
        let fence = code_fence(&code.code);
        let language = code.language.as_deref().unwrap_or("");
        let body = code.code.trim_end_matches('\n');
        self.push_block(&format!("{}{}\n{}\n{}", fence, language, body, fence));
    }

    fn render_link(&mut self, link: &Link) {
        if link.url.trim().is_empty() {
            if !link.text.trim().is_empty() {
                self.render_paragraph(&Paragraph::new(link.text.clone()));
            }
            return;
        }
        self.stats.record(Emitted::Link);
        let text = if link.text.trim().is_empty() {
            link.url.trim()
        } else {
            link.text.trim()
        };
        self.push_block(&format!(
            "[{}]({})",
            escape_link_text(text),
            escape_url(&link.url)
        ));
    }

    fn push_block(&mut self, text: &str) {
        if !self.body.is_empty() {
            self.body.push_str("\n\n");
        }
        self.body.push_str(text);
        self.end_list();
    }

    fn push_list_item(&mut self, line: &str) {
        if !self.body.is_empty() {
            self.body.push_str(if self.last_was_list { "\n" } else { "\n\n" });
        }
        self.body.push_str(line);
        self.last_was_list = true;
    }

    fn end_list(&mut self) {
        self.last_was_list = false;
        self.list_state.clear();
    }
}

/// Wrap escaped text in the markers for `formatting`.
fn format_inline(text: &str, formatting: TextFormatting) -> String {
    let text = text.trim();
    match formatting {
        TextFormatting::Normal => escape_text(text),
        TextFormatting::Bold => format!("**{}**", escape_text(text)),
        TextFormatting::Italic => format!("*{}*", escape_text(text)),
        TextFormatting::BoldItalic => format!("***{}***", escape_text(text)),
        TextFormatting::Code => code_span(text),
    }
}

/// Header row and data rows, promoting the first row to header when the
/// table has none.
fn normalize_table(table: &Table) -> (Vec<String>, Vec<Vec<String>>) {
    if !table.headers.is_empty() {
        return (table.headers.clone(), table.rows.clone());
    }
    match table.rows.split_first() {
        Some((first, rest)) => (first.clone(), rest.to_vec()),
        None => (Vec::new(), Vec::new()),
    }
}

fn standard_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));
    for row in rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines
}

fn compact_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("|{}|", headers.join("|")));
    lines.push(format!("|{}|", vec!["---"; headers.len()].join("|")));
    for row in rows {
        lines.push(format!("|{}|", row.join("|")));
    }
    lines
}

fn grid_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let widths: Vec<usize> = (0..headers.len())
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .chain(std::iter::once(&headers[i]))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let pad_row = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{}{}", cell, " ".repeat(w - cell.chars().count())))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let separator: Vec<String> = widths
        .iter()
        .map(|&w| format!(":{}", "-".repeat(w + 1)))
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(pad_row(headers));
    lines.push(format!("|{}|", separator.join("|")));
    for row in rows {
        lines.push(pad_row(row));
    }
    lines
}
