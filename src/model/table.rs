//! Table type.

use serde::{Deserialize, Serialize};

/// A table: header cells plus data rows.
///
/// Rows are not required to match the header width. Consumers must not
/// assume the table is rectangular.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Header cell texts (may be empty)
    pub headers: Vec<String>,

    /// Data rows
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build a table whose first row is the header.
    ///
    /// A table with a single row has no data to head, so the row becomes
    /// data under generated `Column N` headers.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        match rows.len() {
            0 => Self::default(),
            1 => {
                let width = rows[0].len();
                let headers = (1..=width).map(|i| format!("Column {}", i)).collect();
                Self::new(headers, rows)
            }
            _ => {
                let headers = rows.remove(0);
                Self::new(headers, rows)
            }
        }
    }

    /// Number of columns as defined by the header, falling back to the
    /// widest row when there is no header.
    pub fn column_count(&self) -> usize {
        if !self.headers.is_empty() {
            return self.headers.len();
        }
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has neither header nor rows.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Check whether every row matches the header width.
    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|r| r.len() == width)
    }
}
