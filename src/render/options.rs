//! Rendering options.

use crate::config::{ConversionConfig, TableStyle};

/// Options for rendering a document as Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Shift applied to every heading level (result clamped to 1-6)
    pub heading_offset: i32,

    /// Pipe table layout
    pub table_style: TableStyle,

    /// Include YAML frontmatter with metadata
    pub include_frontmatter: bool,

    /// Inline image payloads as base64 data URLs
    pub embed_images: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the rendering-related fields of a conversion config.
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            heading_offset: config.heading_offset,
            table_style: config.table_style,
            include_frontmatter: config.include_metadata,
            embed_images: config.embed_images_base64,
        }
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

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable base64 image embedding.
    pub fn with_embedded_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }
}
