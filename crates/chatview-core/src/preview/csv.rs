//! Naive CSV table parsing for previews
//!
//! Lines split on line breaks, cells split on commas. Quoted commas and
//! escaped delimiters are not handled.

use serde::Serialize;

/// Shown instead of a table when nothing could be parsed
pub const EMPTY_TABLE_MESSAGE: &str = "No data to display";

/// Parsed table: first row is the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Number of columns, taken from the widest of header and rows
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }
}

/// Parse `content` into a table. `None` when there is no non-blank line.
pub fn parse(content: &str) -> Option<CsvTable> {
    let mut lines = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_row);

    let header = lines.next()?;
    Some(CsvTable {
        header,
        rows: lines.collect(),
    })
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}
