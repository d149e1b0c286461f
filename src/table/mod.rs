//! In-memory tabular data model

mod column;
mod value;

use std::collections::HashSet;

pub use column::{infer_from_text, parse_number, unify_cells, Column, ColumnType};
pub use value::{format_float, CellValue};

/// A row-major table with named, typed columns.
///
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create a table. Rows shorter than the header are padded with nulls;
    /// longer rows are cut to the header width.
    pub fn new(columns: Vec<Column>, mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, CellValue::Null);
        }
        Self { columns, rows }
    }

    /// Build a table from column-major data
    pub fn from_columns(columns: Vec<(Column, Vec<CellValue>)>) -> Self {
        let num_rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut rows: Vec<Vec<CellValue>> = (0..num_rows)
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();
        let mut headers = Vec::with_capacity(columns.len());
        for (column, values) in columns {
            let mut values = values.into_iter();
            for row in rows.iter_mut() {
                row.push(values.next().unwrap_or(CellValue::Null));
            }
            headers.push(column);
        }
        Self {
            columns: headers,
            rows,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Index of the first column with the given name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[column])
    }

    pub fn null_count(&self, column: usize) -> usize {
        self.column_values(column).filter(|v| v.is_null()).count()
    }

    /// Number of distinct non-null values in a column
    pub fn unique_count(&self, column: usize) -> usize {
        self.column_values(column)
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Remove the columns at the given indices
    pub fn drop_columns(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let drop: HashSet<usize> = indices.iter().copied().collect();
        let keep: Vec<bool> = (0..self.columns.len()).map(|i| !drop.contains(&i)).collect();

        let mut idx = 0;
        self.columns.retain(|_| {
            let k = keep[idx];
            idx += 1;
            k
        });
        for row in &mut self.rows {
            let mut idx = 0;
            row.retain(|_| {
                let k = keep[idx];
                idx += 1;
                k
            });
        }
    }

    /// Keep only the rows for which `f` returns true
    pub fn retain_rows<F>(&mut self, f: F)
    where
        F: FnMut(&Vec<CellValue>) -> bool,
    {
        self.rows.retain(f);
    }

    /// Replace every column name, in order
    pub fn rename_columns(&mut self, names: Vec<String>) {
        for (column, name) in self.columns.iter_mut().zip(names) {
            column.name = name;
        }
    }

    /// Replace the contents and type of a column
    pub fn set_column(&mut self, column: usize, column_type: ColumnType, values: Vec<CellValue>) {
        self.columns[column].column_type = column_type;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = value;
        }
    }

    /// Apply `f` to every cell of a column in place
    pub fn map_column<F>(&mut self, column: usize, mut f: F)
    where
        F: FnMut(&mut CellValue),
    {
        for row in &mut self.rows {
            f(&mut row[column]);
        }
    }
}
