//! Structural checks on rendered Markdown.

use crate::render::escape::{count_pipes, split_table_row};
use crate::render::{fence_open, is_fence_close, is_list_item};
use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in the Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// 1-based line number
    pub line: Option<usize>,
    pub message: String,
    pub context: Option<String>,
}

impl ValidationIssue {
    fn new(severity: Severity, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity,
            line: Some(line),
            message: message.into(),
            context: None,
        }
    }

    fn with_context(mut self, context: &str) -> Self {
        let context: String = context.trim().chars().take(60).collect();
        self.context = Some(context);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity)?;
        if let Some(line) = self.line {
            write!(f, " Line {}:", line)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(ref context) = self.context {
            write!(f, " Context: {}", context)?;
        }
        Ok(())
    }
}

/// Result of validating a Markdown text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// True when there are no error-severity issues
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationResult {
    fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        issues.sort_by_key(|i| i.line.unwrap_or(0));
        let error_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        let warning_count = issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count();
        Self {
            valid: error_count == 0,
            issues,
            error_count,
            warning_count,
        }
    }

    /// Issues of the given severity.
    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Human-readable report grouped by severity.
    pub fn format_issues(&self) -> String {
        if self.issues.is_empty() {
            return "No issues found".to_string();
        }
        let mut out = Vec::new();
        for (severity, title) in [
            (Severity::Error, "Errors"),
            (Severity::Warning, "Warnings"),
            (Severity::Info, "Info"),
        ] {
            let group: Vec<String> = self
                .by_severity(severity)
                .map(|i| format!("  {}", i))
                .collect();
            if !group.is_empty() {
                out.push(format!("{} ({}):", title, group.len()));
                out.extend(group);
            }
        }
        out.join("\n")
    }
}

/// Markdown validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownValidator;

impl MarkdownValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check `markdown` for structural problems.
    pub fn validate(&self, markdown: &str) -> ValidationResult {
        let lines: Vec<&str> = markdown.lines().collect();
        let mut issues = Vec::new();

        let skip = frontmatter_len(&lines);
        let mut fence: Option<(usize, char, usize)> = None;
        let mut table_starts = Vec::new();
        let mut i = skip;

        while i < lines.len() {
            let line = lines[i];
            let number = i + 1;

            if let Some((_, ch, len)) = fence {
                if is_fence_close(line, ch, len) {
                    fence = None;
                }
                i += 1;
                continue;
            }
            if let Some((ch, len)) = fence_open(line) {
                fence = Some((number, ch, len));
                i += 1;
                continue;
            }

            if line.trim_start().starts_with('|') {
                let end = lines[i..]
                    .iter()
                    .position(|l| !l.trim_start().starts_with('|'))
                    .map_or(lines.len(), |p| i + p);
                if let Some(start) = check_table(&lines[i..end], i, &mut issues) {
                    table_starts.push(start);
                }
                i = end;
                continue;
            }

            check_heading(line, number, &mut issues);
            check_links(line, number, &mut issues);
            check_ordered_list(line, number, &mut issues);
            i += 1;
        }

        if let Some((open_line, _, _)) = fence {
            issues.push(
                ValidationIssue::new(Severity::Error, open_line, "Unclosed code block")
                    .with_context(lines[open_line - 1]),
            );
        }

        check_tables_recognized(markdown, &lines, &table_starts, &mut issues);

        ValidationResult::from_issues(issues)
    }
}

/// Number of leading lines taken by a YAML front-matter block.
fn frontmatter_len(lines: &[&str]) -> usize {
    if lines.first() != Some(&"---") {
        return 0;
    }
    lines
        .iter()
        .skip(1)
        .position(|l| *l == "---")
        .map_or(0, |p| p + 2)
}

fn is_separator_row(line: &str) -> bool {
    let cells = split_table_row(line);
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim();
            let inner = c.trim_start_matches(':').trim_end_matches(':');
            !inner.is_empty() && inner.chars().all(|ch| ch == '-')
        })
}

/// Check a run of pipe lines starting at index `offset`. Returns the index
/// of the header line when the run has the shape of a table.
fn check_table(rows: &[&str], offset: usize, issues: &mut Vec<ValidationIssue>) -> Option<usize> {
    let header = rows.first()?;
    let expected = count_pipes(header);

    if rows.len() < 2 || !is_separator_row(rows[1]) {
        issues.push(
            ValidationIssue::new(Severity::Warning, offset + 1, "Table is missing a separator row")
                .with_context(header),
        );
        return None;
    }

    for (n, row) in rows.iter().enumerate().skip(1) {
        let found = count_pipes(row);
        if found != expected {
            issues.push(
                ValidationIssue::new(
                    Severity::Warning,
                    offset + n + 1,
                    format!(
                        "Table column count mismatch: expected {} columns, found {}",
                        expected.saturating_sub(1),
                        found.saturating_sub(1)
                    ),
                )
                .with_context(row),
            );
        }
    }
    Some(offset)
}

fn check_heading(line: &str, number: usize, issues: &mut Vec<ValidationIssue>) {
    if !line.starts_with('#') {
        return;
    }
    let hashes = line.chars().take_while(|&c| c == '#').count();
    let rest = &line[hashes..];

    if hashes > 6 {
        issues.push(
            ValidationIssue::new(
                Severity::Warning,
                number,
                format!("Heading level {} exceeds maximum of 6", hashes),
            )
            .with_context(line),
        );
    } else if !rest.is_empty() && !rest.starts_with(' ') {
        issues.push(
            ValidationIssue::new(Severity::Warning, number, "Heading is missing a space after '#'")
                .with_context(line),
        );
    }
}

fn link_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(^|[^\\])!?\[([^\]\\]*)\]\(([^)]*)\)").ok())
        .as_ref()
}

fn check_links(line: &str, number: usize, issues: &mut Vec<ValidationIssue>) {
    let Some(pattern) = link_pattern() else {
        return;
    };
    for caps in pattern.captures_iter(line) {
        let text = caps.get(2).map_or("", |m| m.as_str());
        let url = caps.get(3).map_or("", |m| m.as_str());
        let whole = caps.get(0).map_or("", |m| m.as_str());

        if text.trim().is_empty() {
            issues.push(
                ValidationIssue::new(Severity::Warning, number, "Link has empty text")
                    .with_context(whole),
            );
        }
        if url.trim().is_empty() {
            issues.push(
                ValidationIssue::new(Severity::Warning, number, "Link has empty URL")
                    .with_context(whole),
            );
        }
    }
}

fn check_ordered_list(line: &str, number: usize, issues: &mut Vec<ValidationIssue>) {
    let t = line.trim_start();
    let digits = t.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 || is_list_item(line) {
        return;
    }
    let mut rest = t[digits..].chars();
    if rest.next() == Some('.') {
        if let Some(next) = rest.next() {
            if !next.is_whitespace() && !next.is_ascii_digit() {
                issues.push(
                    ValidationIssue::new(
                        Severity::Warning,
                        number,
                        "Ordered list item is missing a space after the number",
                    )
                    .with_context(line),
                );
            }
        }
    }
}

/// Flag pipe tables that a GFM parser does not recognize as tables.
fn check_tables_recognized(
    markdown: &str,
    lines: &[&str],
    table_starts: &[usize],
    issues: &mut Vec<ValidationIssue>,
) {
    if table_starts.is_empty() {
        return;
    }

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(markdown.match_indices('\n').map(|(i, _)| i + 1))
        .collect();
    let line_of = |offset: usize| line_starts.partition_point(|&s| s <= offset) - 1;

    let recognized: HashSet<usize> = Parser::new_ext(markdown, Options::ENABLE_TABLES)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Table(_)) => Some(line_of(range.start)),
            _ => None,
        })
        .collect();

    for &start in table_starts {
        if !recognized.contains(&start) {
            issues.push(
                ValidationIssue::new(
                    Severity::Warning,
                    start + 1,
                    "Table is not recognized as a Markdown table",
                )
                .with_context(lines[start]),
            );
        }
    }
}
