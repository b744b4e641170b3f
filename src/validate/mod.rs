//! Pre-flight input checks and structural checks of produced Markdown.

mod file;
mod markdown;

pub use file::{FileValidation, FileValidator};
pub use markdown::{MarkdownValidator, Severity, ValidationIssue, ValidationResult};
