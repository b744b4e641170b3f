//! Markdown escaping for the contexts the serializer writes text into.

/// Characters with Markdown meaning in running text.
const SPECIAL: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '#', '+', '-', '.', '!', '|', '~', '<', '>',
];

/// Escape running text (paragraphs, headings, list items).
pub fn escape_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}

/// Escape a table cell: pipes and backslashes are escaped and line breaks
/// become `<br>` so the cell stays on one row.
pub fn escape_table_cell(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut lines = text.trim().lines().map(str::trim).peekable();
    while let Some(line) = lines.next() {
        for c in line.chars() {
            if c == '\\' || c == '|' {
                result.push('\\');
            }
            result.push(c);
        }
        if lines.peek().is_some() {
            result.push_str("<br>");
        }
    }
    result
}

/// Escape link or image label text.
pub fn escape_link_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '[' | ']' => {
                result.push('\\');
                result.push(c);
            }
            '\n' | '\r' => result.push(' '),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode the characters that would end a link destination early.
pub fn escape_url(url: &str) -> String {
    let mut result = String::with_capacity(url.len());
    for c in url.trim().chars() {
        match c {
            ' ' => result.push_str("%20"),
            '(' => result.push_str("%28"),
            ')' => result.push_str("%29"),
            '<' => result.push_str("%3C"),
            '>' => result.push_str("%3E"),
            _ => result.push(c),
        }
    }
    result
}

/// Wrap `text` in an inline code span that cannot be closed by backticks
/// inside it.
pub fn code_span(text: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(text) + 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{} {} {}", ticks, text, ticks)
    } else {
        format!("{}{}{}", ticks, text, ticks)
    }
}

/// Fence for a code block containing `code`.
pub fn code_fence(code: &str) -> String {
    "`".repeat((longest_backtick_run(code) + 1).max(3))
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Split a table row into cells on unescaped pipes.
///
/// Leading and trailing border pipes are dropped; cell text is returned
/// untrimmed.
pub fn split_table_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);

    if line.starts_with('|') && !cells.is_empty() {
        cells.remove(0);
    }
    if line.ends_with('|') && cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Count unescaped pipes in a line.
pub fn count_pipes(line: &str) -> usize {
    let mut count = 0;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '|' => count += 1,
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_text("[link]"), "\\[link\\]");
        assert_eq!(escape_text("a_b.c"), "a\\_b\\.c");
        assert_eq!(escape_text("~<x>~"), "\\~\\<x\\>\\~");
        assert_eq!(escape_text("plain words"), "plain words");
        assert_eq!(escape_text("日本語 😀 ∑"), "日本語 😀 ∑");
    }

    #[test]
    fn test_escape_table_cell() {
        assert_eq!(escape_table_cell("a|b"), "a\\|b");
        assert_eq!(escape_table_cell("line1\nline2"), "line1<br>line2");
        assert_eq!(escape_table_cell("  *x*  "), "*x*");
    }

    #[test]
    fn test_escape_url_and_link() {
        assert_eq!(escape_url("images/my pic (1).png"), "images/my%20pic%20%281%29.png");
        assert_eq!(escape_link_text("a [b]"), "a \\[b\\]");
    }

    #[test]
    fn test_code_span() {
        assert_eq!(code_span("x"), "`x`");
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_fence("no ticks"), "```");
        assert_eq!(code_fence("````"), "`````");
    }

    #[test]
    fn test_split_and_count() {
        assert_eq!(split_table_row("| a | b\\|c |"), vec![" a ", " b\\|c "]);
        assert_eq!(split_table_row("|a||b|"), vec!["a", "", "b"]);
        assert_eq!(count_pipes("| a | b\\|c |"), 3);
        assert_eq!(count_pipes("|a\\\\|b|"), 3);
    }
}
