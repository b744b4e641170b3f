//! Worksheet projection and rendering.

use doc2md::parser::{sheet_to_section, EMPTY_SHEET};
use doc2md::render::serialize;
use doc2md::{ConversionConfig, InternalDocument};

fn render(sections: Vec<doc2md::Section>) -> String {
    let mut doc = InternalDocument::new();
    for section in sections {
        doc.add_section(section);
    }
    serialize(&doc, &ConversionConfig::default()).unwrap()
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_empty_sheet_is_marked() {
    let markdown = render(vec![sheet_to_section(
        "Blank",
        vec![row(&["", " "]), row(&[])],
    )]);
    assert_eq!(markdown, "## Blank\n\n*\\(Empty sheet\\)*\n");
    assert_eq!(EMPTY_SHEET, "(Empty sheet)");
}

#[test]
fn test_sheet_becomes_table() {
    let markdown = render(vec![sheet_to_section(
        "Budget",
        vec![
            row(&["Item", "Cost", ""]),
            row(&["", "", ""]),
            row(&["Paper", "12", ""]),
        ],
    )]);
    assert_eq!(
        markdown,
        "## Budget\n\n| Item | Cost |\n| --- | --- |\n| Paper | 12 |\n"
    );
}

#[test]
fn test_sheets_keep_order() {
    let markdown = render(vec![
        sheet_to_section("First", vec![row(&["a"])]),
        sheet_to_section("Second", vec![]),
    ]);
    let first = markdown.find("## First").unwrap();
    let second = markdown.find("## Second").unwrap();
    assert!(first < second);
    assert!(markdown.contains("| Column 1 |"));
}
