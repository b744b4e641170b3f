//! Sections and headings.

use super::Block;
use serde::{Deserialize, Serialize};

/// Highest heading level Markdown supports.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// A section heading. Levels are 1-6 before any offset is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

impl Heading {
    /// Create a heading.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Create a heading, clamping `level` into the 1-6 range.
    pub fn clamped(level: i64, text: impl Into<String>) -> Self {
        let level = level.clamp(1, MAX_HEADING_LEVEL as i64) as u8;
        Self::new(level, text)
    }

    /// Whether the level is within 1-6.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_HEADING_LEVEL).contains(&self.level)
    }

    /// Rendered level after applying `offset`, always within 1-6.
    pub fn rendered_level(&self, offset: i32) -> u8 {
        (self.level as i32)
            .saturating_add(offset)
            .clamp(1, MAX_HEADING_LEVEL as i32) as u8
    }
}

/// An optional heading followed by content blocks in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<Heading>,
    pub blocks: Vec<Block>,
}

impl Section {
    /// Create a body-only section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a section introduced by `heading`.
    pub fn with_heading(heading: Heading) -> Self {
        Self {
            heading: Some(heading),
            blocks: Vec::new(),
        }
    }

    /// Append a content block.
    pub fn push(&mut self, block: impl Into<Block>) {
        self.blocks.push(block.into());
    }

    /// A section with neither heading nor content.
    pub fn is_empty(&self) -> bool {
        self.heading.is_none() && self.blocks.is_empty()
    }
}
