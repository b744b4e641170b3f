//! Image references.

use serde::{Deserialize, Serialize};

/// A reference to image data held out of band in the document's resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Resource id correlating to the binary payload
    pub id: String,

    /// Alternative text
    pub alt_text: Option<String>,

    /// Path (relative to the Markdown output) the image was written to
    pub extracted_path: Option<String>,

    /// Text recognized in the image
    pub ocr_text: Option<String>,

    /// Page the image was found on, when known
    pub page_number: Option<u32>,
}

impl ImageReference {
    /// Create a reference to the resource `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the alternative text.
    pub fn with_alt_text(mut self, alt: impl Into<String>) -> Self {
        self.alt_text = Some(alt.into());
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page_number = Some(page);
        self
    }

    /// Alt text, or a generic fallback.
    pub fn alt(&self) -> &str {
        self.alt_text
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("image")
    }
}
