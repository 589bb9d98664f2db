use crate::spreadsheet::cell::Cell;
use std::collections::BTreeMap;

/// Cells of one worksheet as read from the file, keyed by (row, column).
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    cells: BTreeMap<(usize, usize), Cell>,
    row_upper_bound: Option<usize>,
    col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: BTreeMap::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Adds a cell; a later cell at the same position replaces the earlier one.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.row_upper_bound = self.row_upper_bound.max(Some(cell.row));
        self.col_upper_bound = self.col_upper_bound.max(Some(cell.col));
        self.cells.insert((cell.row, cell.col), cell);
    }

    /// Number of columns from A to the rightmost used column.
    pub(crate) fn width(&self) -> usize {
        self.col_upper_bound.map(|col| col + 1).unwrap_or(0)
    }

    /// Number of rows from 1 to the last used row.
    pub(crate) fn height(&self) -> usize {
        self.row_upper_bound.map(|row| row + 1).unwrap_or(0)
    }

    /// Rows that hold at least one cell, as (row index, cells in column order).
    pub(crate) fn rows(&self) -> Vec<(usize, Vec<&Cell>)> {
        let mut rows: Vec<(usize, Vec<&Cell>)> = Vec::new();
        for ((row, _), cell) in &self.cells {
            match rows.last_mut() {
                Some((last, cells)) if last == row => cells.push(cell),
                _ => rows.push((*row, vec![cell])),
            }
        }
        rows
    }
}
