//! Embedded binary resources (image payloads).

/// MIME types with their file extensions, preferred extension first.
const IMAGE_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/bmp", &["bmp"]),
    ("image/tiff", &["tiff", "tif"]),
    ("image/webp", &["webp"]),
    ("image/x-emf", &["emf"]),
    ("image/x-wmf", &["wmf"]),
];

/// An embedded resource held alongside the document until extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Raw binary data
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,

    /// Original filename inside the source package, if known
    pub filename: Option<String>,
}

impl Resource {
    /// Create an image resource.
    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            filename: None,
        }
    }

    /// Create an image resource, detecting the MIME type from magic bytes
    /// and then from the filename extension.
    pub fn detect(data: Vec<u8>, filename: &str) -> Self {
        let mime = Self::detect_mime_type(&data)
            .or_else(|| mime_from_extension(filename))
            .unwrap_or("image/png");
        Self::image(data, mime).with_filename(filename)
    }

    /// Set filename.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Get the size of the resource data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File extension for the MIME type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        IMAGE_TYPES
            .iter()
            .find(|(mime, _)| *mime == self.mime_type)
            .map_or("png", |(_, exts)| exts[0])
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }
        if data.starts_with(b"BM") {
            return Some("image/bmp");
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("image/webp");
        }
        None
    }
}

fn mime_from_extension(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(mime, _)| *mime)
}
