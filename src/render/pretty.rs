//! Whitespace and layout normalization of rendered Markdown.
//!
//! The printer groups lines into blocks (headings, tables, lists, code
//! fences, text) and joins the blocks with exactly one blank line. Trailing
//! whitespace is trimmed, front-matter and fenced code are left untouched,
//! and pipe tables can be column-aligned. Formatting its own output returns
//! it unchanged.

use crate::config::{ConversionConfig, TableStyle};

use super::escape::split_table_row;

/// Options for the pretty printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrettyOptions {
    /// Pad table cells so that column borders line up
    pub align_tables: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self { align_tables: true }
    }
}

impl PrettyOptions {
    /// Align tables only for the standard style; compact tables stay
    /// compact and grid tables are already padded.
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            align_tables: config.table_style == TableStyle::Standard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Heading,
    Table,
    List,
    Fence,
    Text,
}

#[derive(Debug)]
struct LineBlock {
    kind: BlockKind,
    lines: Vec<String>,
}

/// Markdown pretty printer.
#[derive(Debug, Clone, Default)]
pub struct PrettyPrinter {
    options: PrettyOptions,
}

impl PrettyPrinter {
    pub fn new(options: PrettyOptions) -> Self {
        Self { options }
    }

    /// Normalize `markdown`.
    pub fn format(&self, markdown: &str) -> String {
        let text = markdown.replace("\r\n", "\n");

        let (frontmatter, body) = split_frontmatter(&text);
        let blocks = self.collect_blocks(body);
        let body = blocks
            .iter()
            .map(|b| b.lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut output = String::with_capacity(text.len());
        if let Some(fm) = frontmatter {
            output.push_str(fm);
            if !body.is_empty() {
                output.push('\n');
            }
        }
        if !body.is_empty() {
            output.push_str(&body);
            output.push('\n');
        }
        output
    }

    fn collect_blocks(&self, body: &str) -> Vec<LineBlock> {
        let mut blocks: Vec<LineBlock> = Vec::new();
        let mut pending_blank = false;
        let mut fence: Option<(char, usize)> = None;

        for raw in body.lines() {
            if let Some((ch, len)) = fence {
                if let Some(block) = blocks.last_mut() {
                    block.lines.push(raw.to_string());
                }
                if is_fence_close(raw, ch, len) {
                    fence = None;
                }
                continue;
            }

            let line = raw.trim_end();
            if line.is_empty() {
                pending_blank = true;
                continue;
            }

            if let Some(open) = fence_open(line) {
                fence = Some(open);
                blocks.push(LineBlock {
                    kind: BlockKind::Fence,
                    lines: vec![line.to_string()],
                });
                pending_blank = false;
                continue;
            }

            let previous = blocks.last().map(|b| b.kind);
            let kind = classify(line, previous);

            let merge = !pending_blank
                && previous == Some(kind)
                && matches!(kind, BlockKind::Table | BlockKind::List | BlockKind::Text);
            match blocks.last_mut() {
                Some(block) if merge => block.lines.push(line.to_string()),
                _ => blocks.push(LineBlock {
                    kind,
                    lines: vec![line.to_string()],
                }),
            }
            pending_blank = false;
        }

        if self.options.align_tables {
            for block in blocks.iter_mut().filter(|b| b.kind == BlockKind::Table) {
                if let Some(aligned) = align_table(&block.lines) {
                    block.lines = aligned;
                }
            }
        }
        blocks
    }
}

/// Format `markdown` with default options.
pub fn pretty_print(markdown: &str) -> String {
    PrettyPrinter::default().format(markdown)
}

fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    if let Some(stripped) = text.strip_prefix("---\n") {
        if let Some(end) = stripped.find("\n---\n") {
            let fm_end = 4 + end + 5;
            return (Some(&text[..fm_end]), &text[fm_end..]);
        }
        if stripped.ends_with("\n---") {
            return (Some(text), "");
        }
    }
    (None, text)
}

fn classify(line: &str, previous: Option<BlockKind>) -> BlockKind {
    if is_heading(line) {
        BlockKind::Heading
    } else if line.trim_start().starts_with('|') {
        BlockKind::Table
    } else if is_list_item(line)
        || (previous == Some(BlockKind::List) && line.starts_with(char::is_whitespace))
    {
        BlockKind::List
    } else {
        BlockKind::Text
    }
}

fn is_heading(line: &str) -> bool {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes) && line[hashes..].chars().next().map_or(true, |c| c == ' ')
}

pub(crate) fn is_list_item(line: &str) -> bool {
    let t = line.trim_start();
    if let Some(rest) = t.strip_prefix(['-', '*', '+']) {
        return rest.starts_with(' ');
    }
    let digits = t.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return false;
    }
    let rest = &t[digits..];
    (rest.starts_with(". ") || rest.starts_with(") ")) && rest.len() > 2
}

/// Fence character and length when `line` opens a code fence. A backtick
/// fence's info string may not contain a backtick, so a line such as
/// ```` ``` ``x ``` ```` is an inline code span.
pub(crate) fn fence_open(line: &str) -> Option<(char, usize)> {
    let t = line.trim_start();
    let ch = t.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = t.chars().take_while(|&c| c == ch).count();
    if len < 3 || (ch == '`' && t[len..].contains('`')) {
        return None;
    }
    Some((ch, len))
}

pub(crate) fn is_fence_close(line: &str, ch: char, len: usize) -> bool {
    let t = line.trim();
    let run = t.chars().take_while(|&c| c == ch).count();
    run >= len && run == t.chars().count()
}

fn is_separator_cell(cell: &str) -> bool {
    let c = cell.trim();
    let inner = c.trim_start_matches(':').trim_end_matches(':');
    !inner.is_empty() && inner.chars().all(|ch| ch == '-') && c.len() - inner.len() <= 2
}

/// Column-align a pipe table. Returns `None` when the block is not a
/// well-formed table (no separator row, or rows of different widths).
fn align_table(lines: &[String]) -> Option<Vec<String>> {
    let rows: Vec<Vec<String>> = lines
        .iter()
        .map(|l| split_table_row(l).iter().map(|c| c.trim().to_string()).collect())
        .collect();

    let width = rows.first()?.len();
    if width == 0 || rows.len() < 2 || rows.iter().any(|r| r.len() != width) {
        return None;
    }
    if !rows[1].iter().all(|c| is_separator_cell(c)) {
        return None;
    }

    let widths: Vec<usize> = (0..width)
        .map(|i| {
            rows.iter()
                .enumerate()
                .filter(|(n, _)| *n != 1)
                .map(|(_, r)| r[i].chars().count())
                .max()
                .unwrap_or(0)
                .max(3)
        })
        .collect();

    let mut out = Vec::with_capacity(rows.len());
    for (n, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| {
                if n == 1 {
                    separator_cell(cell, w)
                } else {
                    format!("{}{}", cell, " ".repeat(w - cell.chars().count()))
                }
            })
            .collect();
        out.push(format!("| {} |", cells.join(" | ")));
    }
    Some(out)
}

fn separator_cell(cell: &str, width: usize) -> String {
    let left = cell.starts_with(':');
    let right = cell.len() > 1 && cell.ends_with(':');
    let dashes = width - usize::from(left) - usize::from(right);
    format!(
        "{}{}{}",
        if left { ":" } else { "" },
        "-".repeat(dashes),
        if right { ":" } else { "" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_whitespace_and_blank_lines() {
        let input = "# Title   \n\n\n\nBody text  \n\n\n\n\nMore\n\n\n";
        assert_eq!(pretty_print(input), "# Title\n\nBody text\n\nMore\n");
    }

    #[test]
    fn test_blank_lines_around_blocks() {
        let input = "Intro\n# Heading\nText\n| a | b |\n| --- | --- |\n| 1 | 2 |\nAfter\n- item\n- item2\nEnd";
        let out = pretty_print(input);
        assert_eq!(
            out,
            "Intro\n\n# Heading\n\nText\n\n| a   | b   |\n| --- | --- |\n| 1   | 2   |\n\nAfter\n\n- item\n- item2\n\nEnd\n"
        );
    }

    #[test]
    fn test_fenced_code_untouched() {
        let input = "```\ncode   \n\n\n\n# not a heading\n```\ntext";
        let out = pretty_print(input);
        assert_eq!(out, "```\ncode   \n\n\n\n# not a heading\n```\n\ntext\n");
    }

    #[test]
    fn test_frontmatter_preserved() {
        let input = "---\ntitle: \"x\"\n---\n\n\n# H\n";
        assert_eq!(pretty_print(input), "---\ntitle: \"x\"\n---\n\n# H\n");
    }

    #[test]
    fn test_align_keeps_alignment_markers() {
        let input = "| name | n |\n|:--|--:|\n| longer name | 1 |\n";
        let out = pretty_print(input);
        assert_eq!(
            out,
            "| name        | n   |\n| :---------- | --: |\n| longer name | 1   |\n"
        );
    }

    #[test]
    fn test_malformed_table_left_alone() {
        let input = "| a | b |\n| --- | --- |\n| 1 |\n";
        assert_eq!(pretty_print(input), input);
    }

    #[test]
    fn test_compact_tables_not_aligned() {
        let printer = PrettyPrinter::new(PrettyOptions {
            align_tables: false,
        });
        let input = "|a|bb|\n|---|---|\n|1|2|\n";
        assert_eq!(printer.format(input), input);
    }

    #[test]
    fn test_nested_list_continuation() {
        let input = "1. one\n   - nested\n2. two\n";
        assert_eq!(pretty_print(input), input);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "# A\ntext\n\n\n| x | y |\n|---|---|\n| 1 | 22 |\n- a\n  b\n```rust\nfn f() {}\n```\n",
            "---\na: 1\n---\nbody",
            "",
            "plain",
        ];
        for input in inputs {
            let once = pretty_print(input);
            assert_eq!(pretty_print(&once), once);
        }
    }

    #[test]
    fn test_inline_code_span_is_not_a_fence() {
        let input = "``` ``tick ```\n\n| a | b |\n| --- | --- |\n| 1 | 22 |\n\n\n\n## After\n";
        let out = pretty_print(input);
        assert_eq!(
            out,
            "``` ``tick ```\n\n| a   | b   |\n| --- | --- |\n| 1   | 22  |\n\n## After\n"
        );
        assert_eq!(fence_open("```rust"), Some(('`', 3)));
        assert_eq!(fence_open("~~~ a`b"), Some(('~', 3)));
        assert_eq!(fence_open("``` ``tick ```"), None);
    }

    #[test]
    fn test_escaped_hash_is_text() {
        assert!(!is_heading("\\# not heading"));
        assert!(is_heading("## yes"));
        assert!(!is_heading("#nospace"));
        assert!(is_list_item("10. ten"));
        assert!(!is_list_item("**bold**"));
    }
}
