//! Document-level types.

use super::{Block, ImageReference, Resource, Section};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed document, independent of its source format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InternalDocument {
    /// Document metadata (title, author, etc.)
    pub metadata: DocumentMetadata,

    /// Sections in reading order
    pub sections: Vec<Section>,

    /// Embedded image payloads, keyed by image reference id
    #[serde(skip)]
    pub resources: HashMap<String, Resource>,
}

impl InternalDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Add an embedded resource.
    pub fn add_resource(&mut self, id: impl Into<String>, resource: Resource) {
        self.resources.insert(id.into(), resource);
    }

    /// Get a resource by id.
    pub fn get_resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Check if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate over every content block in reading order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// Iterate over every image reference in reading order.
    pub fn images(&self) -> impl Iterator<Item = &ImageReference> {
        self.blocks().filter_map(|b| match b {
            Block::Image(img) => Some(img),
            _ => None,
        })
    }

    /// Mutable iteration over every image reference in reading order.
    pub fn images_mut(&mut self) -> impl Iterator<Item = &mut ImageReference> {
        self.sections
            .iter_mut()
            .flat_map(|s| s.blocks.iter_mut())
            .filter_map(|b| match b {
                Block::Image(img) => Some(img),
                _ => None,
            })
    }

    /// Number of sections that carry a heading.
    pub fn heading_count(&self) -> usize {
        self.sections.iter().filter(|s| s.heading.is_some()).count()
    }

    /// Number of tables in the document.
    pub fn table_count(&self) -> usize {
        self.blocks()
            .filter(|b| matches!(b, Block::Table(_)))
            .count()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// Source format name ("docx", "xlsx", "pdf")
    pub source_format: Option<String>,

    /// Page (or sheet) count, when the source has the notion
    pub page_count: Option<u32>,

    /// When the parser produced this document
    pub extracted_at: Option<DateTime<Utc>>,
}

impl DocumentMetadata {
    /// Create metadata for a source format.
    pub fn for_format(source_format: impl Into<String>) -> Self {
        Self {
            source_format: Some(source_format.into()),
            extracted_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Convert metadata to YAML front-matter.
    ///
    /// The extraction timestamp is deliberately left out so that rendering
    /// the same document twice yields identical output.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        if let Some(ref title) = self.title {
            lines.push(format!("title: \"{}\"", escape_yaml(title)));
        }
        if let Some(ref author) = self.author {
            lines.push(format!("author: \"{}\"", escape_yaml(author)));
        }
        if let Some(ref created) = self.created {
            lines.push(format!("created: \"{}\"", created.to_rfc3339()));
        }
        if let Some(ref modified) = self.modified {
            lines.push(format!("modified: \"{}\"", modified.to_rfc3339()));
        }
        if let Some(ref format) = self.source_format {
            lines.push(format!("source_format: \"{}\"", escape_yaml(format)));
        }

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for double-quoted YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Heading, Paragraph, Table};

    #[test]
    fn test_frontmatter_fields() {
        let mut meta = DocumentMetadata::for_format("docx");
        meta.title = Some("Quarterly \"Report\"".into());
        meta.author = Some("Ana".into());

        let fm = meta.to_yaml_frontmatter();
        assert!(fm.starts_with("---\n"));
        assert!(fm.contains("title: \"Quarterly \\\"Report\\\"\""));
        assert!(fm.contains("author: \"Ana\""));
        assert!(fm.contains("source_format: \"docx\""));
        assert!(fm.ends_with("---\n"));
        assert!(!fm.contains("extracted_at"));
    }

    #[test]
    fn test_frontmatter_is_valid_yaml() {
        let mut meta = DocumentMetadata::for_format("pdf");
        meta.title = Some("a: b\nc".into());
        let fm = meta.to_yaml_frontmatter();
        let body = fm.trim_start_matches("---\n").trim_end_matches("---\n");
        let value: serde_yaml::Value = serde_yaml::from_str(body).unwrap();
        assert_eq!(value["title"].as_str(), Some("a: b\nc"));
    }

    #[test]
    fn test_counts() {
        let mut doc = InternalDocument::new();
        let mut section = Section::with_heading(Heading::new(1, "Intro"));
        section.push(Paragraph::new("text"));
        section.push(Table::new(vec!["a".into()], vec![]));
        doc.add_section(section);
        doc.add_section(Section::new());

        assert_eq!(doc.heading_count(), 1);
        assert_eq!(doc.table_count(), 1);
        assert_eq!(doc.blocks().count(), 2);
    }
}
