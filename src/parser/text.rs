//! Normalization of text pulled out of source documents.

use unicode_normalization::UnicodeNormalization;

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// NFC-normalize, expand ligatures, and drop replacement and control
/// characters. Newlines and tabs are kept.
pub fn normalize_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.replace("\r\n", "\n").nfc() {
        if let Some((_, expanded)) = LIGATURES.iter().find(|(l, _)| *l == c) {
            result.push_str(expanded);
            continue;
        }
        match c {
            '\u{FFFD}' | '\u{FEFF}' => {}
            '\r' => result.push('\n'),
            '\n' | '\t' => result.push(c),
            c if c.is_control() => {}
            c => result.push(c),
        }
    }
    result
}

/// [`normalize_text`] followed by collapsing all whitespace runs into single
/// spaces, for single-line values such as headings and sheet names.
pub fn clean_inline(text: &str) -> String {
    normalize_text(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
