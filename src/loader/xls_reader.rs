//! Legacy XLS reader
//!
//! BIFF workbooks are read with calamine, which also resolves date-formatted
//! numbers through the workbook's XF records. Only the first sheet is read.

use std::collections::BTreeMap;
use std::io::Cursor;

use anyhow::Result;
use calamine::{Data, Reader, Xls};

use super::sheet::{grid_to_table, SheetRows, MAX_COLUMNS, MAX_ROWS};
use crate::error::CleanerError;
use crate::table::{CellValue, Table};

/// Read XLS bytes into a typed table. The first non-empty row of the first
/// sheet is the header.
pub fn read_xls(bytes: &[u8], name: &str) -> Result<Table> {
    let workbook_error = |message: String| CleanerError::WorkbookError {
        name: name.to_string(),
        message,
    };

    let mut workbook: Xls<_> =
        Xls::new(Cursor::new(bytes)).map_err(|e| workbook_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("workbook has no sheets".to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut grid = SheetRows::new();
    if let Some((first_row, first_col)) = range.start() {
        for (offset, row) in range.rows().enumerate() {
            let row_idx = first_row as usize + offset;
            let cells: BTreeMap<usize, CellValue> = row
                .iter()
                .enumerate()
                .map(|(col, data)| (first_col as usize + col, convert_cell(data)))
                .filter(|(_, value)| !value.is_null())
                .collect();
            if let Some(&col) = cells.keys().next_back() {
                if row_idx >= MAX_ROWS || col >= MAX_COLUMNS {
                    return Err(workbook_error(format!(
                        "cell at row {} column {} is outside the sheet",
                        row_idx + 1,
                        col + 1
                    ))
                    .into());
                }
                grid.insert(row_idx, cells);
            }
        }
    }

    Ok(grid_to_table(grid, name)?)
}

/// BIFF stores every number as a double; whole numbers read back as integers
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Float(dt.as_f64()),
        },
        other => CellValue::Text(other.to_string()),
    }
}
