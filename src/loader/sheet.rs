//! Worksheet grids shared by the workbook readers

use std::collections::BTreeMap;

use super::{is_null_token, normalize_headers};
use crate::error::CleanerError;
use crate::table::{unify_cells, CellValue, Column, Table};

/// Excel's last column, `XFD`
pub(crate) const MAX_COLUMNS: usize = 16_384;

/// Excel's last row
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Non-empty worksheet rows keyed by zero-based row index, each a sparse map
/// of zero-based column index to cell
pub(crate) type SheetRows = BTreeMap<usize, BTreeMap<usize, CellValue>>;

/// Turn a worksheet grid into a table.
///
/// The first non-empty row is the header and keeps its text as written.
/// Data rows run from the row after the header to the last non-empty row;
/// blank rows in between become rows of nulls. Missing-value tokens apply
/// to data cells only.
pub(crate) fn grid_to_table(mut grid: SheetRows, name: &str) -> Result<Table, CleanerError> {
    let (header_row, header) = grid.pop_first().ok_or_else(|| CleanerError::EmptyInput {
        name: name.to_string(),
    })?;

    let width = std::iter::once(&header)
        .chain(grid.values())
        .filter_map(|r| r.keys().next_back())
        .max()
        .map(|m| m + 1)
        .unwrap_or(0);

    let headers = normalize_headers(
        (0..width)
            .map(|col| header.get(&col).map(|v| v.to_string()).unwrap_or_default())
            .collect(),
    );

    let last_row = grid.keys().next_back().copied().unwrap_or(header_row);
    let mut data: Vec<BTreeMap<usize, CellValue>> = (header_row + 1..=last_row)
        .map(|idx| grid.remove(&idx).unwrap_or_default())
        .collect();

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(col, header)| {
            let cells = data
                .iter_mut()
                .map(|row| match row.remove(&col) {
                    Some(CellValue::Text(s)) if is_null_token(&s) => CellValue::Null,
                    Some(value) => value,
                    None => CellValue::Null,
                })
                .collect();
            let (column_type, values) = unify_cells(cells);
            (Column::new(header, column_type), values)
        })
        .collect();

    Ok(Table::from_columns(columns))
}
