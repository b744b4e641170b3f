//! Output destinations: files in a configured encoding, stdout and preview.

use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Number of lines shown in preview mode.
pub const PREVIEW_LINES: usize = 50;

const BANNER_WIDTH: usize = 80;

/// Shared destination for console output (stdout by default).
pub type DisplaySink = Arc<Mutex<Box<dyn Write + Send>>>;

/// A display sink writing to stdout.
pub fn stdout_sink() -> DisplaySink {
    Arc::new(Mutex::new(Box::new(io::stdout())))
}

/// Look up an encoding by its WHATWG label ("utf-8", "shift_jis", ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnsupportedEncoding(label.to_string()))
}

/// Encode `content` without a byte-order mark.
pub fn encode(content: &str, encoding: &'static Encoding) -> Result<Vec<u8>> {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);

    if encoding == UTF_16LE || encoding == UTF_16BE {
        let le = encoding == UTF_16LE;
        return Ok(content
            .encode_utf16()
            .flat_map(|u| if le { u.to_le_bytes() } else { u.to_be_bytes() })
            .collect());
    }

    let (bytes, _, had_errors) = encoding.encode(content);
    if had_errors {
        return Err(Error::Write(format!(
            "content cannot be represented in {}",
            encoding.name()
        )));
    }
    Ok(bytes.into_owned())
}

/// Writes rendered Markdown to its destination.
pub struct OutputWriter {
    encoding: &'static Encoding,
    display: DisplaySink,
}

impl OutputWriter {
    /// Create a writer for the encoding `label`.
    pub fn new(label: &str, display: DisplaySink) -> Result<Self> {
        Ok(Self {
            encoding: resolve_encoding(label)?,
            display,
        })
    }

    /// Write `content` to `path`, creating parent directories.
    pub fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let bytes = encode(content, self.encoding)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Write(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(path, bytes).map_err(|e| Error::Write(format!("{}: {}", path.display(), e)))
    }

    /// Write `content` to the display sink.
    pub fn write_stdout(&self, content: &str) -> Result<()> {
        self.emit(content)
    }

    /// Show the first `max_lines` lines of `content` on the display sink.
    pub fn preview(&self, content: &str, max_lines: usize) -> Result<()> {
        let lines: Vec<&str> = content.lines().collect();
        let rule = "=".repeat(BANNER_WIDTH);

        let mut out = String::new();
        out.push_str(&format!(
            "{}\nPREVIEW (showing first {} lines)\n{}\n",
            rule, max_lines, rule
        ));
        for line in lines.iter().take(max_lines) {
            out.push_str(line);
            out.push('\n');
        }
        if lines.len() > max_lines {
            out.push_str(&format!(
                "\n... {} more lines not shown ...\n",
                lines.len() - max_lines
            ));
        }
        out.push_str(&rule);
        out.push('\n');

        self.emit(&out)
    }

    fn emit(&self, text: &str) -> Result<()> {
        let mut sink = self
            .display
            .lock()
            .map_err(|_| Error::Write("display sink is poisoned".into()))?;
        sink.write_all(text.as_bytes())
            .and_then(|_| sink.flush())
            .map_err(|e| Error::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture() -> (Capture, DisplaySink) {
        let cap = Capture::default();
        let sink: DisplaySink = Arc::new(Mutex::new(Box::new(cap.clone())));
        (cap, sink)
    }

    #[test]
    fn test_utf8_has_no_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub/out.md");
        let (_, sink) = capture();
        let writer = OutputWriter::new("utf-8", sink).unwrap();

        let text = "\u{FEFF}日本語 😀 ∑∫√\n";
        writer.write_file(&path, text).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(!bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        assert_eq!(String::from_utf8(bytes).unwrap(), "日本語 😀 ∑∫√\n");
    }

    #[test]
    fn test_other_encodings() {
        let bytes = encode("é", resolve_encoding("latin1").unwrap()).unwrap();
        assert_eq!(bytes, vec![0xE9]);

        let bytes = encode("A", resolve_encoding("utf-16le").unwrap()).unwrap();
        assert_eq!(bytes, vec![0x41, 0x00]);

        assert!(encode("😀", resolve_encoding("shift_jis").unwrap()).is_err());
    }

    #[test]
    fn test_unknown_encoding() {
        let (_, sink) = capture();
        assert!(matches!(
            OutputWriter::new("klingon", sink),
            Err(Error::UnsupportedEncoding(_))
        ));
    }

    #[test]
    fn test_preview_truncates() {
        let (cap, sink) = capture();
        let writer = OutputWriter::new("utf-8", sink).unwrap();
        let content: String = (1..=60).map(|i| format!("line {}\n", i)).collect();
        writer.preview(&content, PREVIEW_LINES).unwrap();

        let shown = String::from_utf8(cap.0.lock().unwrap().clone()).unwrap();
        assert!(shown.contains("PREVIEW (showing first 50 lines)"));
        assert!(shown.contains("line 50\n"));
        assert!(!shown.contains("line 51"));
        assert!(shown.contains("... 10 more lines not shown ..."));
    }

    #[test]
    fn test_stdout_sink() {
        let (cap, sink) = capture();
        let writer = OutputWriter::new("utf-8", sink).unwrap();
        writer.write_stdout("# Hi\n").unwrap();
        assert_eq!(cap.0.lock().unwrap().as_slice(), b"# Hi\n");
    }
}
