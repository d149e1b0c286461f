//! Automatic cleaning pipeline
//!
//! [`DataCleaner::auto_clean`] runs every step in a fixed order:
//! headers, sparse rows and columns, duplicates, whitespace, type
//! conversion, missing values, constant columns. Each step records what it
//! changed in the [`CleaningReport`] and can also be called on its own.

mod datetime;
mod headers;
mod impute;

use std::collections::HashSet;

use tracing::debug;

use crate::error::CleanerError;
use crate::report::{CleaningReport, ImputedColumn};
use crate::table::{parse_number, unify_cells, CellValue, ColumnType, Table};

pub use datetime::to_datetime;
pub use headers::clean_header;
pub use impute::{median, mode};

/// Default null ratio above which a column is dropped
pub const DEFAULT_COLUMN_NULL_THRESHOLD: f64 = 0.7;

/// Default share of non-null cells a row needs to be kept
pub const DEFAULT_ROW_FILL_RATIO: f64 = 0.7;

/// Tunable thresholds of the cleaning pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanOptions {
    /// Columns whose null ratio is strictly above this are dropped
    pub column_null_threshold: f64,
    /// Rows need at least `columns * row_fill_ratio` non-null cells
    pub row_fill_ratio: f64,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            column_null_threshold: DEFAULT_COLUMN_NULL_THRESHOLD,
            row_fill_ratio: DEFAULT_ROW_FILL_RATIO,
        }
    }
}

impl CleanOptions {
    /// Both ratios must lie in `0.0..=1.0`
    pub fn validate(&self) -> Result<(), CleanerError> {
        check_ratio("column_null_threshold", self.column_null_threshold)?;
        check_ratio("row_fill_ratio", self.row_fill_ratio)
    }
}

fn check_ratio(name: &str, value: f64) -> Result<(), CleanerError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CleanerError::InvalidOption {
            name: name.to_string(),
            value: value.to_string(),
            message: "must be between 0.0 and 1.0".to_string(),
        })
    }
}

/// Cleans one table and collects a report of every change
#[derive(Debug, Clone)]
pub struct DataCleaner {
    table: Table,
    report: CleaningReport,
    options: CleanOptions,
}

impl DataCleaner {
    pub fn new(table: Table, options: CleanOptions) -> Result<Self, CleanerError> {
        options.validate()?;
        let report = CleaningReport::new(table.num_rows(), table.num_columns());
        Ok(Self {
            table,
            report,
            options,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn report(&self) -> &CleaningReport {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut CleaningReport {
        &mut self.report
    }

    /// Run every cleaning step in order
    pub fn auto_clean(mut self) -> (Table, CleaningReport) {
        self.clean_headers();
        self.drop_empty();
        self.handle_duplicates();
        self.remove_trims();
        self.fix_data_types();
        self.handle_missing();
        self.remove_constant_columns();
        self.into_parts()
    }

    /// Finish without running further steps
    pub fn into_parts(mut self) -> (Table, CleaningReport) {
        self.report.final_rows = self.table.num_rows();
        self.report.final_cols = self.table.num_columns();
        (self.table, self.report)
    }

    /// Normalize column headers
    pub fn clean_headers(&mut self) {
        let names: Vec<String> = self
            .table
            .columns()
            .iter()
            .map(|c| clean_header(&c.name))
            .collect();
        self.table.rename_columns(names.clone());
        debug!(columns = ?names, "Cleaned headers");
        self.report.renamed_columns = names;
    }

    /// Drop mostly-empty columns, then mostly-empty rows
    pub fn drop_empty(&mut self) {
        let num_rows = self.table.num_rows();
        let mut to_drop = Vec::new();
        if num_rows > 0 {
            for idx in 0..self.table.num_columns() {
                let ratio = self.table.null_count(idx) as f64 / num_rows as f64;
                if ratio > self.options.column_null_threshold {
                    to_drop.push(idx);
                }
            }
        }
        self.report.dropped_cols = to_drop
            .iter()
            .map(|&idx| self.table.columns()[idx].name.clone())
            .collect();
        self.table.drop_columns(&to_drop);

        let min_filled = self.table.num_columns() as f64 * self.options.row_fill_ratio;
        self.table.retain_rows(|row| {
            let filled = row.iter().filter(|v| !v.is_null()).count();
            filled as f64 >= min_filled
        });
        self.report.remaining_rows = self.table.num_rows();

        debug!(
            dropped_columns = self.report.dropped_cols.len(),
            dropped_rows = num_rows - self.table.num_rows(),
            "Dropped sparse columns and rows"
        );
    }

    /// Remove rows identical to an earlier row
    pub fn handle_duplicates(&mut self) {
        let before = self.table.num_rows();
        let mut seen: HashSet<Vec<CellValue>> = HashSet::with_capacity(before);
        self.table.retain_rows(|row| seen.insert(row.clone()));
        self.report.duplicates_removed = before - self.table.num_rows();
        debug!(removed = self.report.duplicates_removed, "Removed duplicate rows");
    }

    /// Trim surrounding whitespace in every text column
    pub fn remove_trims(&mut self) {
        let text_columns = self.text_column_indices();
        for &idx in &text_columns {
            self.table.map_column(idx, |value| {
                if let CellValue::Text(s) = value {
                    if s.trim().len() != s.len() {
                        *s = s.trim().to_string();
                    }
                }
            });
        }
        self.report.trimmed_columns = text_columns
            .iter()
            .map(|&idx| self.table.columns()[idx].name.clone())
            .collect();
    }

    /// Convert text columns that hold only dates or only numbers
    pub fn fix_data_types(&mut self) {
        for idx in self.text_column_indices() {
            let values: Vec<CellValue> = self.table.column_values(idx).cloned().collect();
            let name = self.table.columns()[idx].name.clone();

            if let Some(converted) = to_datetime(&values) {
                self.table.set_column(idx, ColumnType::DateTime, converted);
                debug!(column = %name, "Converted column to datetime");
                self.report.converted_to_datetime.push(name);
            } else if let Some((column_type, converted)) = to_numeric(&values) {
                self.table.set_column(idx, column_type, converted);
                debug!(column = %name, dtype = %column_type, "Converted column to numeric");
                self.report.converted_to_numeric.push(name);
            }
        }
    }

    /// Fill nulls with the median (numeric columns) or the mode (others)
    pub fn handle_missing(&mut self) {
        for idx in 0..self.table.num_columns() {
            if self.table.null_count(idx) == 0 {
                continue;
            }
            let values: Vec<CellValue> = self.table.column_values(idx).cloned().collect();
            let column_type = self.table.columns()[idx].column_type;

            let (fill, filled_type) = if column_type.is_numeric() {
                match median(&values) {
                    Some(m) => (CellValue::Float(m), ColumnType::Float),
                    None => continue,
                }
            } else {
                match mode(&values) {
                    Some(m) => (m, column_type),
                    None => continue,
                }
            };

            let filled: Vec<CellValue> = values
                .into_iter()
                .map(|v| match v {
                    CellValue::Null => fill.clone(),
                    CellValue::Integer(i) if filled_type == ColumnType::Float => {
                        CellValue::Float(i as f64)
                    }
                    other => other,
                })
                .collect();
            self.table.set_column(idx, filled_type, filled);

            let name = self.table.columns()[idx].name.clone();
            debug!(column = %name, fill = %fill, "Imputed missing values");
            self.report.imputed_cols.push(ImputedColumn {
                column: name,
                dtype: filled_type.dtype_name().to_string(),
            });
        }
    }

    /// Drop columns holding a single distinct non-null value
    pub fn remove_constant_columns(&mut self) {
        let constant: Vec<usize> = (0..self.table.num_columns())
            .filter(|&idx| self.table.unique_count(idx) == 1)
            .collect();
        self.report.constant_cols_removed = constant
            .iter()
            .map(|&idx| self.table.columns()[idx].name.clone())
            .collect();
        self.table.drop_columns(&constant);
    }

    fn text_column_indices(&self) -> Vec<usize> {
        self.table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.column_type == ColumnType::Text)
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Convert a text column to numbers, or `None` if any value is not numeric.
/// Empty strings become nulls.
pub fn to_numeric(values: &[CellValue]) -> Option<(ColumnType, Vec<CellValue>)> {
    let mut any_value = false;
    let parsed: Option<Vec<CellValue>> = values
        .iter()
        .map(|value| match value {
            CellValue::Null => Some(CellValue::Null),
            CellValue::Text(s) if s.trim().is_empty() => Some(CellValue::Null),
            CellValue::Text(s) => {
                any_value = true;
                parse_number(s)
            }
            _ => None,
        })
        .collect();

    let parsed = parsed?;
    if !any_value {
        return None;
    }
    Some(unify_cells(parsed))
}
