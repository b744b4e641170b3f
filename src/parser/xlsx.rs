//! Excel (.xlsx) parser backed by `calamine`.
//!
//! Every worksheet becomes one section headed by the sheet name, holding a
//! single table whose header is the first non-empty row.

use super::text::normalize_text;
use super::DocumentParser;
use crate::detect::{verify_signature, FileFormat};
use crate::error::Result;
use crate::model::{DocumentMetadata, Heading, InternalDocument, Paragraph, Section, Table, TextFormatting};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use std::path::Path;

/// Placeholder paragraph for sheets without values.
pub const EMPTY_SHEET: &str = "(Empty sheet)";

/// Parser for Excel workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxParser;

impl XlsxParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for XlsxParser {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn formats(&self) -> &[FileFormat] {
        &[FileFormat::Xlsx]
    }

    fn parse(&self, path: &Path) -> Result<InternalDocument> {
        verify_signature(path, FileFormat::Xlsx)?;
        let mut workbook = open_workbook_auto(path)?;

        let mut doc = InternalDocument::new();
        doc.metadata = DocumentMetadata::for_format(FileFormat::Xlsx.as_str());
        doc.metadata.title = path.file_name().map(|n| n.to_string_lossy().into_owned());

        let names = workbook.sheet_names();
        doc.metadata.page_count = Some(names.len() as u32);

        for name in names {
            let range = workbook.worksheet_range(&name)?;
            let rows = range
                .rows()
                .map(|row| row.iter().map(format_cell).collect())
                .collect();
            doc.add_section(sheet_to_section(&name, rows));
        }

        log::debug!(
            "Parsed XLSX {}: {} sheets",
            path.display(),
            doc.sections.len()
        );
        Ok(doc)
    }
}

/// Build the section for one worksheet from its formatted cell values.
pub fn sheet_to_section(name: &str, rows: Vec<Vec<String>>) -> Section {
    let mut section = Section::with_heading(Heading::new(2, name));

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();

    if rows.is_empty() {
        section.push(Paragraph::new(EMPTY_SHEET).with_formatting(TextFormatting::Italic));
        return section;
    }

    // Drop trailing columns that are empty in every row.
    let width = rows
        .iter()
        .map(|row| {
            row.iter()
                .rposition(|c| !c.trim().is_empty())
                .map_or(0, |i| i + 1)
        })
        .max()
        .unwrap_or(0);
    let rows = rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .collect();

    section.push(Table::from_rows(rows));
    section
}

/// Render a cell value the way a spreadsheet displays it.
fn format_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => normalize_text(s).trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                format_number(dt.as_f64())
            } else {
                format_serial_date(dt.as_f64())
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Format an Excel serial date (days since 1899-12-30). Values without a
/// time part print as a date only.
fn format_serial_date(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return format_number(serial);
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    let Some(dt) = Duration::try_milliseconds(millis).and_then(|d| epoch.checked_add_signed(d))
    else {
        return format_number(serial);
    };
    if serial.fract() == 0.0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_sheet_placeholder() {
        let section = sheet_to_section("Empty1", vec![]);
        assert_eq!(section.heading, Some(Heading::new(2, "Empty1")));
        assert_eq!(
            section.blocks,
            vec![Block::Paragraph(
                Paragraph::new("(Empty sheet)").with_formatting(TextFormatting::Italic)
            )]
        );

        let blank = sheet_to_section("Blank", vec![row(&["", " "]), row(&[""])]);
        assert!(matches!(&blank.blocks[0], Block::Paragraph(p) if p.text == EMPTY_SHEET));
    }

    #[test]
    fn test_first_non_empty_row_is_header() {
        let section = sheet_to_section(
            "Data",
            vec![
                row(&["", "", ""]),
                row(&["Name", "Qty", ""]),
                row(&["Apple", "3", ""]),
                row(&["Pear", "", ""]),
            ],
        );
        let Block::Table(table) = &section.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.headers, row(&["Name", "Qty"]));
        assert_eq!(table.rows, vec![row(&["Apple", "3"]), row(&["Pear", ""])]);
    }

    #[test]
    fn test_single_row_sheet() {
        let section = sheet_to_section("One", vec![row(&["a", "b"])]);
        let Block::Table(table) = &section.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(table.headers, row(&["Column 1", "Column 2"]));
        assert_eq!(table.rows, vec![row(&["a", "b"])]);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(&Data::Float(3.0)), "3");
        assert_eq!(format_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(format_cell(&Data::Int(-7)), "-7");
        assert_eq!(format_cell(&Data::Bool(true)), "TRUE");
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::String("  ﬁle  ".into())), "file");
    }

    #[test]
    fn test_serial_dates() {
        assert_eq!(format_serial_date(45306.0), "2024-01-15");
        assert_eq!(format_serial_date(45306.5), "2024-01-15 12:00:00");
    }

    #[test]
    fn test_out_of_range_serial_falls_back_to_number() {
        assert_eq!(format_serial_date(1e12), "1000000000000");
        assert_eq!(format_serial_date(-1e14), "-100000000000000");
        assert_eq!(format_serial_date(1e300), format_number(1e300));
    }
}
