//! Rendering of the internal document model as Markdown.
//!
//! [`markdown`] walks an [`InternalDocument`](crate::model::InternalDocument)
//! and emits Markdown text; [`pretty`] normalizes that text afterwards.

pub mod escape;
mod markdown;
mod options;
mod pretty;
mod result;

pub use markdown::{serialize, to_markdown, to_markdown_with_stats, MarkdownSerializer};
pub use options::RenderOptions;
pub use pretty::{pretty_print, PrettyOptions, PrettyPrinter};
pub use result::{Emitted, RenderResult, RenderStats};

pub(crate) use pretty::{fence_open, is_fence_close, is_list_item};
