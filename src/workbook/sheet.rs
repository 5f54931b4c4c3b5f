use crate::workbook::cell::CellValue;
use crate::workbook::DateSystem;
use std::collections::HashMap;

static EMPTY: CellValue = CellValue::Empty;

/// In-memory grid of the cells loaded from one worksheet.
///
/// Cells are stored sparsely; every position inside the bounds that was not
/// stored reads as `CellValue::Empty`.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    date_system: DateSystem,
    cells: HashMap<(usize, usize), CellValue>,
    row_count: usize,
    col_count: usize,
}

impl Worksheet {
    pub fn new(name: &str, date_system: DateSystem) -> Self {
        Self {
            name: name.to_owned(),
            date_system,
            cells: HashMap::new(),
            row_count: 0,
            col_count: 0,
        }
    }

    /// Builds a worksheet from dense rows, mostly useful for callers that
    /// already hold tabular data.
    pub fn from_rows<R, C>(name: &str, date_system: DateSystem, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = CellValue>,
    {
        let mut sheet = Self::new(name, date_system);
        for (row, cells) in rows.into_iter().enumerate() {
            for (col, value) in cells.into_iter().enumerate() {
                sheet.push(row, col, value);
            }
        }
        sheet
    }

    /// Stores a cell, growing the bounds to `max index + 1`.
    /// Empty values only extend the bounds.
    pub fn push(&mut self, row: usize, col: usize, value: CellValue) {
        self.row_count = self.row_count.max(row + 1);
        self.col_count = self.col_count.max(col + 1);
        if value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Iterates over the cells of `row` from column 0 to `col_count - 1`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = &CellValue> + '_ {
        (0..self.col_count).map(move |col| self.get(row, col))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn date_system(&self) -> DateSystem {
        self.date_system
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }
}
