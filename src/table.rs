//! Tabular sources: a grid of text cells, a column resolver and a row range.
use std::ops::Range;

use indexmap::IndexMap;

use crate::tree::DEFAULT_DELIMITER;

/// Rows of a [`Grid`] a record is bound from.
pub type RowRange = Range<usize>;

/// Rectangular (or ragged) grid of text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Splits `text` into lines and cells. Blank lines are skipped, cells are kept verbatim.
    pub fn from_delimited(text: &str, delimiter: char) -> Self {
        let rows = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split(delimiter).map(str::to_string).collect())
            .collect();
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Non-empty cells of `column` within `rows`, in row order.
    pub fn column_values(&self, column: usize, rows: RowRange) -> Vec<&str> {
        let end = rows.end.min(self.rows.len());
        (rows.start.min(end)..end)
            .filter_map(|row| self.cell(row, column))
            .filter(|cell| !cell.is_empty())
            .collect()
    }
}

/// Maps a field name to the column holding its values.
pub trait ColumnResolver {
    fn column(&self, name: &str) -> Option<usize>;
}

impl<F> ColumnResolver for F
where
    F: Fn(&str) -> Option<usize>,
{
    fn column(&self, name: &str) -> Option<usize> {
        self(name)
    }
}

/// Column lookup built from a header row.
///
/// Field names that are paths (`<xmlattr>/id`) fall back to their last segment.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    columns: IndexMap<String, usize>,
    delimiter: char,
}

impl HeaderIndex {
    pub fn from_header(header: &[String], delimiter: char) -> Self {
        let mut columns = IndexMap::new();
        for (index, name) in header.iter().enumerate() {
            columns.entry(name.trim().to_string()).or_insert(index);
        }
        Self { columns, delimiter }
    }

    /// Uses the first row as header; the remaining rows are the data range.
    pub fn from_grid(grid: &Grid) -> (Self, RowRange) {
        let header = grid.row(0).unwrap_or_default();
        let index = Self::from_header(header, DEFAULT_DELIMITER);
        (index, 1.min(grid.row_count())..grid.row_count())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl ColumnResolver for HeaderIndex {
    fn column(&self, name: &str) -> Option<usize> {
        if let Some(index) = self.columns.get(name) {
            return Some(*index);
        }
        let last = name.rsplit(self.delimiter).next()?;
        self.columns.get(last).copied()
    }
}
