//! Content blocks.

use super::{ImageReference, Table};
use serde::{Deserialize, Serialize};

/// A content block inside a section.
///
/// The serializer matches on this exhaustively, so adding a variant is a
/// compile-time checked change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of text, possibly a list item
    Paragraph(Paragraph),

    /// A table
    Table(Table),

    /// A reference to an embedded image
    Image(ImageReference),

    /// Preformatted code
    CodeBlock(CodeBlock),

    /// A standalone hyperlink
    Link(Link),
}

impl From<Paragraph> for Block {
    fn from(p: Paragraph) -> Self {
        Block::Paragraph(p)
    }
}

impl From<Table> for Block {
    fn from(t: Table) -> Self {
        Block::Table(t)
    }
}

impl From<ImageReference> for Block {
    fn from(i: ImageReference) -> Self {
        Block::Image(i)
    }
}

impl From<CodeBlock> for Block {
    fn from(c: CodeBlock) -> Self {
        Block::CodeBlock(c)
    }
}

impl From<Link> for Block {
    fn from(l: Link) -> Self {
        Block::Link(l)
    }
}

/// Inline formatting applied to a whole paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormatting {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
    Code,
}

impl TextFormatting {
    /// Combine bold and italic flags into a formatting tag.
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => TextFormatting::BoldItalic,
            (true, false) => TextFormatting::Bold,
            (false, true) => TextFormatting::Italic,
            (false, false) => TextFormatting::Normal,
        }
    }
}

/// List marker kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// List membership of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub kind: ListKind,
    /// Nesting level (0 = top level)
    pub level: u8,
}

impl ListItem {
    pub fn bullet(level: u8) -> Self {
        Self {
            kind: ListKind::Bullet,
            level,
        }
    }

    pub fn ordered(level: u8) -> Self {
        Self {
            kind: ListKind::Ordered,
            level,
        }
    }
}

/// A paragraph of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    pub formatting: TextFormatting,
    pub list: Option<ListItem>,
}

impl Paragraph {
    /// Create a plain paragraph.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the formatting tag.
    pub fn with_formatting(mut self, formatting: TextFormatting) -> Self {
        self.formatting = formatting;
        self
    }

    /// Mark the paragraph as a list item.
    pub fn with_list(mut self, list: ListItem) -> Self {
        self.list = Some(list);
        self
    }

    /// Check if the paragraph has no visible text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A block of preformatted code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub code: String,
    pub language: Option<String>,
}

impl CodeBlock {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

impl Link {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}
