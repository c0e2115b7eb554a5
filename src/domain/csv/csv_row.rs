// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed CSV content

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single data row in a CSV file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    /// Row index (0-based). Counts data records only: the header, comment
    /// lines and blank lines are not rows, so after a blank line the index
    /// no longer matches the line number. A row of one empty cell is `""`.
    pub index: usize,

    /// Raw cell values, in column order
    pub cells: Vec<String>,
}

impl CsvRow {
    /// Create a new CSV row
    pub fn new(index: usize, cells: Vec<String>) -> Self {
        Self { index, cells }
    }

    /// Cell at a column position, if the row is long enough
    pub fn cell(&self, idx: usize) -> Option<&str> {
        self.cells.get(idx).map(String::as_str)
    }

    /// Whether every cell is blank
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// Resolves a mapping's `column_name` to a cell position.
///
/// Header names win; when there is no header (or no header matches) a name
/// made only of uppercase ASCII letters is read as a spreadsheet column (A, B, ..., AA).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndex {
    headers: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(header: Option<&[String]>) -> Self {
        let headers: Vec<String> = header.map(|h| h.to_vec()).unwrap_or_default();
        let mut by_name = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            by_name.entry(name.trim().to_string()).or_insert(idx);
        }
        Self { headers, by_name }
    }

    /// Original header names (empty when the input had no header)
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_header(&self) -> bool {
        !self.headers.is_empty()
    }

    pub fn resolve(&self, column_name: &str) -> Option<usize> {
        let name = column_name.trim();
        if let Some(idx) = self.by_name.get(name) {
            return Some(*idx);
        }
        if name.chars().all(|c| c.is_ascii_uppercase()) {
            return column_letters_to_index(name);
        }
        None
    }
}

/// Spreadsheet column letters to a 0-based index: A -> 0, Z -> 25, AA -> 26.
pub fn column_letters_to_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut acc: usize = 0;
    for c in name.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    Some(acc - 1)
}
