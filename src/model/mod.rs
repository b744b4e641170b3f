//! Internal document model.
//!
//! This module defines the format-agnostic intermediate representation that
//! every parser projects its source into and that the Markdown serializer
//! walks. It carries no behavior beyond construction and traversal helpers.

mod block;
mod document;
mod image;
mod resource;
mod section;
mod table;

pub use block::{Block, CodeBlock, Link, ListItem, ListKind, Paragraph, TextFormatting};
pub use document::{DocumentMetadata, InternalDocument};
pub use image::ImageReference;
pub use resource::Resource;
pub use section::{Heading, Section};
pub use table::Table;
